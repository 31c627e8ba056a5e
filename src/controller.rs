/*!
Standard NES joypad behind $4016/$4017.

Serial protocol:
- Button order on the wire: A, B, Select, Start, Up, Down, Left, Right.
- Writing bit 0 = 1 to $4016 raises the strobe: the shift register keeps
  reloading from the live buttons and every read returns button A.
- Writing bit 0 = 0 freezes the snapshot; each read returns the next bit,
  and once all 8 bits have been shifted out reads return 1.
*/

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    /// Bit of this button in the serial report (A = bit 0).
    #[inline]
    pub fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Controller {
    buttons: u8,
    shift: u8,
    strobe: bool,
    // Bits already shifted out since the strobe fell.
    index: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }

    pub fn press(&mut self, button: Button) {
        self.set_button(button, true);
    }

    pub fn release(&mut self, button: Button) {
        self.set_button(button, false);
    }

    /// Replace every button at once (bit layout of `Button::mask`).
    pub fn set_state_mask(&mut self, mask: u8) {
        self.buttons = mask;
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    pub fn write_strobe(&mut self, value: u8) {
        self.strobe = value & 1 != 0;
        if self.strobe {
            self.reload();
        }
    }

    /// One serial read; only bit 0 carries data.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.reload();
            return self.shift & 1;
        }
        if self.index >= 8 {
            return 1;
        }
        let bit = (self.shift >> self.index) & 1;
        self.index += 1;
        bit
    }

    fn reload(&mut self) {
        self.shift = self.buttons;
        self.index = 0;
    }
}

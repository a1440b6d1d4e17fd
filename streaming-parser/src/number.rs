/// The lexical class of the last character of a number being scanned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NumberClass {
    Sign,
    /// A lone leading `0`, after which only `.` or an exponent may follow.
    LeadingZero,
    Digit,
    Decimal,
    FractionDigit,
    ExpE,
    ExpSign,
    ExpDigit,
}

impl NumberClass {
    /// The class after the first character, which must be `-` or a digit.
    pub(crate) fn start(ch: char) -> Option<Self> {
        match ch {
            '-' => Some(NumberClass::Sign),
            '0' => Some(NumberClass::LeadingZero),
            '1'..='9' => Some(NumberClass::Digit),
            _ => None,
        }
    }

    pub(crate) fn transition(self, ch: char) -> Option<Self> {
        use NumberClass::*;

        match (self, ch) {
            (Sign, '0') => Some(LeadingZero),
            (Sign, '1'..='9') => Some(Digit),
            (LeadingZero | Digit | FractionDigit, 'e' | 'E') => Some(ExpE),
            (LeadingZero | Digit, '.') => Some(Decimal),
            (Digit, '0'..='9') => Some(Digit),
            (Decimal | FractionDigit, '0'..='9') => Some(FractionDigit),
            (ExpE, '+' | '-') => Some(ExpSign),
            (ExpE | ExpSign | ExpDigit, '0'..='9') => Some(ExpDigit),
            _ => None,
        }
    }

    /// Whether a number may end after this class.
    pub(crate) fn is_terminal(self) -> bool {
        matches!(
            self,
            NumberClass::LeadingZero
                | NumberClass::Digit
                | NumberClass::FractionDigit
                | NumberClass::ExpDigit
        )
    }
}

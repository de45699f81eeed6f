use strum::{AsRefStr, EnumString};

/// Keywords of the command language.
///
/// Keywords are case-insensitive. The verbs that open a command double as
/// the names shown in confirmation prompts and timing reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive, serialize_all = "snake_case")]
pub enum Keyword {
    CreateTable,
    DropTable,
    ListTables,
    Insert,
    Select,
    Update,
    Delete,
    Info,
    Help,
    Exit,

    Into,
    Values,
    From,
    Where,
    Set,
}

impl Keyword {
    /// Whether this keyword can start a command.
    pub fn is_verb(self) -> bool {
        !matches!(
            self,
            Self::Into | Self::Values | Self::From | Self::Where | Self::Set
        )
    }
}

//! Reader and player backends selected at startup.

mod player;
mod reader;

pub use player::{DryrunPlayer, SonosPlayer};
pub use reader::{
    DryrunReader, InputError, NfcReader, format_uid, normalize_uid, parse_dryrun_input,
};

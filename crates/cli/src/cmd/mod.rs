mod check;
mod once;
mod run;

pub use check::cmd_check;
pub use once::cmd_once;
pub use run::cmd_run;

use core::str::FromStr;

use stocktake_core::Quantity;

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Save the given count for the current material and advance.
    Save(Quantity),
    /// Save the count currently shown for the material (initially recorded stock).
    SaveDefault,
    Next,
    Previous,
    SaveAll,
    Finish,
    Quit,
    Help,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" => Ok(Command::SaveDefault),
            "n" | "next" => Ok(Command::Next),
            "p" | "prev" | "previous" => Ok(Command::Previous),
            "s" | "save-all" => Ok(Command::SaveAll),
            "f" | "finish" => Ok(Command::Finish),
            "q" | "quit" => Ok(Command::Quit),
            "h" | "?" | "help" => Ok(Command::Help),
            _ => line
                .parse::<Quantity>()
                .map(Command::Save)
                .map_err(|e| format!("unrecognised input {line:?}: {e}")),
        }
    }
}

pub const HELP: &str = "\
<number>  save count and advance
<enter>   save the shown count and advance
n / p     next / previous material without saving
s         save all pending corrections
f         finish the pass
q         cancel and quit";

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(Vec<PathBuf>),
    Remove(String),
    Clear,
    List,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const HELP: &str = "commands: add <path>..., rm <name>, clear, list, help, quit";

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    match verb {
        "" => Command::Empty,
        "add" if !rest.is_empty() => {
            Command::Add(rest.split_whitespace().map(PathBuf::from).collect())
        }
        "rm" | "remove" if !rest.is_empty() => Command::Remove(rest.to_string()),
        "clear" => Command::Clear,
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(
            parse_command("add a.csv  b.xlsx"),
            Command::Add(vec![PathBuf::from("a.csv"), PathBuf::from("b.xlsx")])
        );
        assert_eq!(
            parse_command("rm my file.csv"),
            Command::Remove("my file.csv".to_string())
        );
        assert_eq!(parse_command("  list "), Command::List);
        assert_eq!(parse_command("clear"), Command::Clear);
        assert_eq!(parse_command("q"), Command::Quit);
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn missing_arguments_are_unknown() {
        assert_eq!(parse_command("add"), Command::Unknown("add".to_string()));
        assert_eq!(parse_command("rm "), Command::Unknown("rm".to_string()));
        assert_eq!(
            parse_command("upload x"),
            Command::Unknown("upload x".to_string())
        );
    }
}

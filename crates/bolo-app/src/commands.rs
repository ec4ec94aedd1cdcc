//! Parsing of interactive input lines.

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Login(String),
    Logout,
    Lang(String),
    Languages,
    Listen,
    Send,
    History,
    WhoAmI,
    Help,
    Quit,
    Message(String),
    Unknown(String),
    Empty,
}

pub const HELP: &str = "\
Type a question and press Enter to ask it.
  /login <user>      log in and load your history
  /logout            forget the login and clear the conversation
  /lang <code|name>  switch language (no argument shows the current one)
  /languages         list available languages
  /listen            start or stop speech capture
  /send              send what was heard
  /history           show past sessions
  /whoami            show the logged-in user
  /help              show this help
  /quit              exit";

pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim().to_string()),
        None => (command, String::new()),
    };
    match name.to_lowercase().as_str() {
        "login" => Input::Login(arg),
        "logout" => Input::Logout,
        "lang" | "language" => Input::Lang(arg),
        "languages" => Input::Languages,
        "listen" | "mic" => Input::Listen,
        "send" => Input::Send,
        "history" => Input::History,
        "whoami" => Input::WhoAmI,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            parse_line("  population of Delhi? "),
            Input::Message("population of Delhi?".into())
        );
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_line("   "), Input::Empty);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(parse_line("/login alice"), Input::Login("alice".into()));
        assert_eq!(parse_line("/lang  Hindi "), Input::Lang("Hindi".into()));
        assert_eq!(parse_line("/lang"), Input::Lang(String::new()));
        assert_eq!(parse_line("/LOGIN bob"), Input::Login("bob".into()));
    }

    #[test]
    fn test_bare_commands() {
        assert_eq!(parse_line("/logout"), Input::Logout);
        assert_eq!(parse_line("/languages"), Input::Languages);
        assert_eq!(parse_line("/listen"), Input::Listen);
        assert_eq!(parse_line("/send"), Input::Send);
        assert_eq!(parse_line("/history"), Input::History);
        assert_eq!(parse_line("/whoami"), Input::WhoAmI);
        assert_eq!(parse_line("/help"), Input::Help);
        assert_eq!(parse_line("/quit"), Input::Quit);
        assert_eq!(parse_line("/frobnicate"), Input::Unknown("frobnicate".into()));
    }
}

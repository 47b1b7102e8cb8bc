//! Parsing of interactive CLI input.
//!
//! Pure functions, no I/O.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Join(String),
    Leave(String),
    Status,
    Messages,
    Clear,
    Help,
    Quit,
}

/// Parse one line of user input.
///
/// # Errors
///
/// Returns a human-readable message for unknown commands or missing arguments.
pub fn parse_command(line: &str) -> Result<CliCommand, String> {
    let line = line.trim();
    let (name, argument) = match line.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (line, ""),
    };

    let require_group = |command: &str| {
        if argument.is_empty() {
            Err(format!("Usage: {} <group>", command))
        } else {
            Ok(argument.to_string())
        }
    };

    match name {
        "/join" => require_group("/join").map(CliCommand::Join),
        "/leave" => require_group("/leave").map(CliCommand::Leave),
        "/status" => Ok(CliCommand::Status),
        "/messages" => Ok(CliCommand::Messages),
        "/clear" => Ok(CliCommand::Clear),
        "/help" => Ok(CliCommand::Help),
        "/quit" | "/exit" => Ok(CliCommand::Quit),
        _ => Err(format!("Unknown command '{}'. Type /help for usage.", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join_and_leave() {
        // テスト項目: /join と /leave はグループ名を引数として受け取る
        // given (前提条件):
        let join = "/join ops";
        let leave = "  /leave   night shift  ";

        // when (操作):
        let join = parse_command(join);
        let leave = parse_command(leave);

        // then (期待する結果):
        assert_eq!(join, Ok(CliCommand::Join("ops".to_string())));
        assert_eq!(leave, Ok(CliCommand::Leave("night shift".to_string())));
    }

    #[test]
    fn test_parse_join_without_group() {
        // テスト項目: グループ名のない /join は使い方を返す
        // given (前提条件):
        let line = "/join";

        // when (操作):
        let result = parse_command(line);

        // then (期待する結果):
        assert_eq!(result, Err("Usage: /join <group>".to_string()));
    }

    #[test]
    fn test_parse_simple_commands() {
        // テスト項目: 引数のないコマンドが解釈される
        // given (前提条件):
        let cases = [
            ("/status", CliCommand::Status),
            ("/messages", CliCommand::Messages),
            ("/clear", CliCommand::Clear),
            ("/help", CliCommand::Help),
            ("/quit", CliCommand::Quit),
            ("/exit", CliCommand::Quit),
        ];

        for (line, expected) in cases {
            // when (操作):
            let result = parse_command(line);

            // then (期待する結果):
            assert_eq!(result, Ok(expected));
        }
    }

    #[test]
    fn test_parse_unknown_command() {
        // テスト項目: 未知のコマンドはエラーになる
        // given (前提条件):
        let line = "hello";

        // when (操作):
        let result = parse_command(line);

        // then (期待する結果):
        assert!(result.unwrap_err().contains("Unknown command 'hello'"));
    }
}

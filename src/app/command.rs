//! `:` command parsing

use std::path::PathBuf;

use crate::course::ChapterPath;
use crate::learning::Language;
use crate::learning::quiz::OPTION_COUNT;

/// Parsed `:` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Next chapter: next or n
    Next,
    /// Previous chapter: prev or p
    Prev,
    /// Jump to a chapter: goto <topic> <subtopic> <chapter> (1-based)
    Goto(ChapterPath),
    /// Reload a failed chapter: retry or r
    Retry,
    /// Start a quiz on the current chapter: quiz
    Quiz,
    /// Answer the current question: answer <1-4>
    Answer(usize),
    /// Next quiz question: continue or c
    Continue,
    /// Leave the quiz: exit-quiz or x
    ExitQuiz,
    /// Generate a visual, optionally saving it: visualize [file]
    Visualize(Option<PathBuf>),
    /// Switch display language: lang <code>
    Lang(Language),
    /// Message the tutor: ask <message>
    Ask(String),
    /// Grounded web search: research <query>
    Research(String),
    /// Toggle the tutor's thinking mode: think
    Think,
    /// Forget the tutor conversation: clear-chat
    ClearChat,
    /// Show help: help, h or ?
    Help,
    /// Save progress and leave: quit or q
    Quit,
    /// Empty input
    Nop,
}

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// Successfully parsed command
    Ok(Command),
    /// Unknown command
    UnknownCommand(String),
    /// Command needs an argument
    MissingArgument(String),
    /// Argument present but unusable
    InvalidArgument(String),
}

/// Parse one line of input
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(Command::Nop);
    }

    // Split into command and arguments
    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");

    match cmd.to_lowercase().as_str() {
        "next" | "n" => ParseResult::Ok(Command::Next),
        "prev" | "p" => ParseResult::Ok(Command::Prev),
        "goto" | "g" => {
            if args.is_empty() {
                ParseResult::MissingArgument("goto".to_string())
            } else {
                parse_path(args)
            }
        }
        "retry" | "r" => ParseResult::Ok(Command::Retry),
        "quiz" => ParseResult::Ok(Command::Quiz),
        "answer" | "a" => {
            if args.is_empty() {
                return ParseResult::MissingArgument("answer".to_string());
            }
            match args.parse::<usize>() {
                Ok(n) if (1..=OPTION_COUNT).contains(&n) => ParseResult::Ok(Command::Answer(n - 1)),
                _ => ParseResult::InvalidArgument(format!(
                    "answer must be a number from 1 to {}",
                    OPTION_COUNT
                )),
            }
        }
        "continue" | "c" => ParseResult::Ok(Command::Continue),
        "exit-quiz" | "x" => ParseResult::Ok(Command::ExitQuiz),
        "visualize" | "v" => {
            let file = (!args.is_empty()).then(|| PathBuf::from(args));
            ParseResult::Ok(Command::Visualize(file))
        }
        "lang" | "l" => {
            if args.is_empty() {
                return ParseResult::MissingArgument("lang".to_string());
            }
            match args.parse::<Language>() {
                Ok(language) => ParseResult::Ok(Command::Lang(language)),
                Err(e) => ParseResult::InvalidArgument(e),
            }
        }
        "ask" => {
            if args.is_empty() {
                ParseResult::MissingArgument("ask".to_string())
            } else {
                ParseResult::Ok(Command::Ask(args.to_string()))
            }
        }
        "research" | "search" => {
            if args.is_empty() {
                ParseResult::MissingArgument("research".to_string())
            } else {
                ParseResult::Ok(Command::Research(args.to_string()))
            }
        }
        "think" => ParseResult::Ok(Command::Think),
        "clear-chat" => ParseResult::Ok(Command::ClearChat),
        "help" | "h" | "?" => ParseResult::Ok(Command::Help),
        "quit" | "q" => ParseResult::Ok(Command::Quit),
        _ => ParseResult::UnknownCommand(cmd.to_string()),
    }
}

/// Parse a 1-based `topic subtopic chapter` triple (spaces or dots)
fn parse_path(args: &str) -> ParseResult {
    let numbers: Vec<usize> = args
        .split(|c: char| c.is_whitespace() || c == '.')
        .filter(|s| !s.is_empty())
        .map_while(|s| s.parse().ok())
        .collect();

    match numbers.as_slice() {
        [t, s, c] if *t > 0 && *s > 0 && *c > 0 => {
            ParseResult::Ok(Command::Goto(ChapterPath::new(t - 1, s - 1, c - 1)))
        }
        _ => ParseResult::InvalidArgument(
            "goto expects three positions counted from 1, e.g. `goto 1 2 3`".to_string(),
        ),
    }
}

/// Help overlay text
pub const HELP: &str = "\
Keys
  j/k, arrows        scroll, or move the outline selection
  n/l, p/h           next / previous chapter
  Enter              open selected chapter, next quiz question
  Esc                close quiz, visual or help
  Tab, [ ]           focus panel, toggle outline / tutor
  t, 1-4             start quiz, answer
  v, L, r            visualize, switch language, retry
  a, /               ask the tutor, research the web
  :, ?               command line, this help

Commands
  :goto <t> <s> <c>  jump to a chapter (e.g. :goto 1 2 3)
  :visualize [file]  generate a visual (and save it)
  :lang <en|bn>      change display language
  :ask <message>     message the tutor
  :research <query>  grounded web search
  :think             toggle tutor thinking mode
  :clear-chat        forget the conversation
  :q                 save progress and leave";

use std::collections::VecDeque;
use std::io::{self, BufRead, Write, stdin, stdout};

/// The interactive channel between safedd and the person at the keyboard.
pub trait Prompter {
    /// Show informational text.
    fn say(&mut self, text: &str);

    /// Show `question` and read one line of input. Returns `None` at end of
    /// input.
    fn ask(&mut self, question: &str) -> io::Result<Option<String>>;
}

pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn say(&mut self, text: &str) {
        println!("{}", text);
    }

    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        print!("{}", question);
        stdout().flush()?;

        let mut input = String::new();
        if stdin().lock().read_line(&mut input)? == 0 {
            // Keep the shell prompt off the question line
            println!();
            return Ok(None);
        }

        Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Replays canned answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub transcript: Vec<String>,
    pub questions: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn asked(&self, needle: &str) -> bool {
        self.questions.iter().any(|q| q.contains(needle))
    }

    pub fn said(&self, needle: &str) -> bool {
        self.transcript.iter().any(|t| t.contains(needle))
    }
}

impl Prompter for ScriptedPrompter {
    fn say(&mut self, text: &str) {
        self.transcript.push(text.to_string());
    }

    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        self.questions.push(question.to_string());
        self.transcript.push(question.to_string());
        Ok(self.answers.pop_front())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

/// Interpret a yes/no reply. Empty input is a "no"; anything that is not
/// clearly yes or no yields `None`.
pub fn parse_answer(input: &str) -> Option<Answer> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(Answer::Yes),
        "" | "n" | "no" => Some(Answer::No),
        _ => None,
    }
}

/// Ask until the reply is an unambiguous yes or no. End of input is a no.
pub fn confirm(prompter: &mut dyn Prompter, question: &str) -> io::Result<bool> {
    let question = format!("{} [y/N] ", question);
    loop {
        let Some(reply) = prompter.ask(&question)? else {
            return Ok(false);
        };
        match parse_answer(&reply) {
            Some(Answer::Yes) => return Ok(true),
            Some(Answer::No) => return Ok(false),
            None => prompter.say("Please answer 'yes' or 'no'."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_tokens() {
        assert_eq!(parse_answer("y"), Some(Answer::Yes));
        assert_eq!(parse_answer(" YES \n"), Some(Answer::Yes));
        assert_eq!(parse_answer("No"), Some(Answer::No));
        assert_eq!(parse_answer(""), Some(Answer::No));
        assert_eq!(parse_answer("yep"), None);
        assert_eq!(parse_answer("1"), None);
    }

    #[test]
    fn test_confirm_reprompts_until_clear_answer() {
        let mut prompter = ScriptedPrompter::new(["maybe", "sure", "yes"]);
        assert!(confirm(&mut prompter, "Proceed?").unwrap());
        assert_eq!(prompter.questions.len(), 3);
        assert!(prompter.said("Please answer"));
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        let mut prompter = ScriptedPrompter::new([""]);
        assert!(!confirm(&mut prompter, "Proceed?").unwrap());
    }

    #[test]
    fn test_confirm_end_of_input_is_no() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        assert!(!confirm(&mut prompter, "Proceed?").unwrap());
    }
}

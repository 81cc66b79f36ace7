//! The y/N/edit prompt shown at the approval gate.
use std::io::{self, BufRead, Read, Write};

use coldreach_core::ApprovalDecision;

pub const PROMPT: &str = "Approve and mock-send? [y/N/edit]: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Approve,
    Reject,
    Edit,
}

/// Anything other than yes or edit is a rejection.
pub fn parse_choice(answer: &str) -> Choice {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Choice::Approve,
        "e" | "edit" => Choice::Edit,
        _ => Choice::Reject,
    }
}

/// Show `draft` and read the operator's decision from `input`.
///
/// An edit reads until EOF. A blank edit keeps the drafted email.
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    draft: &str,
) -> io::Result<ApprovalDecision> {
    writeln!(output, "\n===== EMAIL DRAFT FOR APPROVAL =====\n")?;
    writeln!(output, "{}", draft)?;
    writeln!(output, "\n====================================\n")?;
    write!(output, "{}", PROMPT)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    match parse_choice(&answer) {
        Choice::Approve => Ok(ApprovalDecision::approve()),
        Choice::Reject => Ok(ApprovalDecision::reject()),
        Choice::Edit => {
            writeln!(
                output,
                "Enter your edited email draft. Finish with Ctrl-D (Ctrl-Z then Enter on Windows).\n"
            )?;
            output.flush()?;
            let mut edited = String::new();
            input.read_to_string(&mut edited)?;
            if edited.trim().is_empty() {
                writeln!(output, "No edits provided; keeping the original draft.")?;
                Ok(ApprovalDecision::approve())
            } else {
                Ok(ApprovalDecision::approve_with_edit(edited.trim_end()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(answer: &str) -> (ApprovalDecision, String) {
        let mut input = Cursor::new(answer.as_bytes().to_vec());
        let mut output = Vec::new();
        let decision = ask(&mut input, &mut output, "Subject: Hi").unwrap();
        (decision, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("Y\n"), Choice::Approve);
        assert_eq!(parse_choice(" yes "), Choice::Approve);
        assert_eq!(parse_choice("edit"), Choice::Edit);
        assert_eq!(parse_choice(""), Choice::Reject);
        assert_eq!(parse_choice("nope"), Choice::Reject);
    }

    #[test]
    fn test_approve() {
        let (decision, shown) = run("y\n");
        assert_eq!(decision, ApprovalDecision::approve());
        assert!(shown.contains("Subject: Hi"));
        assert!(shown.contains(PROMPT));
    }

    #[test]
    fn test_default_is_reject() {
        assert_eq!(run("\n").0, ApprovalDecision::reject());
        assert_eq!(run("").0, ApprovalDecision::reject());
    }

    #[test]
    fn test_edit_replaces_draft() {
        let (decision, _) = run("edit\nSubject: New\n\nBody\n");
        assert_eq!(decision, ApprovalDecision::approve_with_edit("Subject: New\n\nBody"));
    }

    #[test]
    fn test_blank_edit_keeps_draft() {
        let (decision, shown) = run("edit\n   \n");
        assert_eq!(decision, ApprovalDecision::approve());
        assert!(shown.contains("keeping the original draft"));
    }
}

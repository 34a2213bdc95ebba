//! Operator command parsing.

use thiserror::Error;

use pos_products::ProductCode;

pub const HELP: &str = "\
Commands:
  add               add a blank row
  code <CODE>       look up a product for the pending row (bare text works too)
  qty <N>           confirm the pending row with quantity N (alias: confirm)
  cancel <ROW>      remove the row at position ROW
  checkout          submit the cart as one sale
  show              print the cart
  help              print this help
  quit              leave";

/// One line of operator input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Add,
    Lookup(ProductCode),
    /// `None` when the typed quantity was not a number; the cart rejects it.
    Confirm(Option<i64>),
    /// Zero-based display index.
    Cancel(usize),
    Checkout,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Nothing to do")]
    Empty,

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a row number")]
    InvalidRow(String),
}

impl OperatorCommand {
    pub fn parse(line: &str) -> Result<Self, InputError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(InputError::Empty);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "add" | "new" => Ok(Self::Add),
            "code" | "lookup" => {
                if rest.is_empty() {
                    return Err(InputError::MissingArgument("code"));
                }
                Ok(Self::Lookup(ProductCode::new(rest)))
            }
            "qty" | "confirm" => {
                if rest.is_empty() {
                    return Err(InputError::MissingArgument("qty"));
                }
                Ok(Self::Confirm(rest.parse().ok()))
            }
            "cancel" | "rm" => {
                if rest.is_empty() {
                    return Err(InputError::MissingArgument("cancel"));
                }
                match rest.parse::<usize>() {
                    Ok(position) if position >= 1 => Ok(Self::Cancel(position - 1)),
                    _ => Err(InputError::InvalidRow(rest.to_string())),
                }
            }
            "checkout" => Ok(Self::Checkout),
            "show" | "ls" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            _ => Ok(Self::Lookup(ProductCode::new(line))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords() {
        assert_eq!(OperatorCommand::parse("add"), Ok(OperatorCommand::Add));
        assert_eq!(OperatorCommand::parse("  CHECKOUT "), Ok(OperatorCommand::Checkout));
        assert_eq!(OperatorCommand::parse("show"), Ok(OperatorCommand::Show));
        assert_eq!(OperatorCommand::parse("help"), Ok(OperatorCommand::Help));
        assert_eq!(OperatorCommand::parse("quit"), Ok(OperatorCommand::Quit));
    }

    #[test]
    fn code_keeps_inner_spaces() {
        assert_eq!(
            OperatorCommand::parse("code A 1/0"),
            Ok(OperatorCommand::Lookup(ProductCode::new("A 1/0")))
        );
        assert_eq!(
            OperatorCommand::parse("code"),
            Err(InputError::MissingArgument("code"))
        );
    }

    #[test]
    fn bare_text_is_a_lookup() {
        assert_eq!(
            OperatorCommand::parse("A100"),
            Ok(OperatorCommand::Lookup(ProductCode::new("A100")))
        );
    }

    #[test]
    fn quantity_that_is_not_a_number_is_passed_on() {
        assert_eq!(OperatorCommand::parse("qty 3"), Ok(OperatorCommand::Confirm(Some(3))));
        assert_eq!(OperatorCommand::parse("confirm -2"), Ok(OperatorCommand::Confirm(Some(-2))));
        assert_eq!(OperatorCommand::parse("qty three"), Ok(OperatorCommand::Confirm(None)));
        assert_eq!(OperatorCommand::parse("qty 1.5"), Ok(OperatorCommand::Confirm(None)));
    }

    #[test]
    fn cancel_is_one_based() {
        assert_eq!(OperatorCommand::parse("cancel 1"), Ok(OperatorCommand::Cancel(0)));
        assert_eq!(OperatorCommand::parse("cancel 3"), Ok(OperatorCommand::Cancel(2)));
        assert_eq!(
            OperatorCommand::parse("cancel 0"),
            Err(InputError::InvalidRow("0".to_string()))
        );
        assert_eq!(
            OperatorCommand::parse("cancel x"),
            Err(InputError::InvalidRow("x".to_string()))
        );
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(OperatorCommand::parse("   "), Err(InputError::Empty));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_integer_quantity_parses(q in any::<i64>()) {
                prop_assert_eq!(
                    OperatorCommand::parse(&format!("qty {q}")),
                    Ok(OperatorCommand::Confirm(Some(q)))
                );
            }

            #[test]
            fn cancel_position_maps_to_index(position in 1usize..10_000) {
                prop_assert_eq!(
                    OperatorCommand::parse(&format!("cancel {position}")),
                    Ok(OperatorCommand::Cancel(position - 1))
                );
            }
        }
    }
}

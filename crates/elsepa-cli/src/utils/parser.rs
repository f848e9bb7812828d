use elsepa::core::io::toml_settings::parse_literal;
use elsepa::core::settings::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    MissingEquals(String),

    #[error("Key cannot be empty in assignment '{0}'.")]
    EmptyKey(String),
}

/// Splits `KEY=VALUE` and reads the value as a TOML literal, falling back to
/// plain text (`EV=100 eV` and `EV="100 eV"` are equivalent).
pub fn parse_assignment(text: &str) -> Result<(&str, Value), ParseError> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| ParseError::MissingEquals(text.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(text.to_string()));
    }
    Ok((key, parse_literal(value.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_read_as_toml_literals() {
        assert_eq!(parse_assignment("IZ=79").unwrap(), ("IZ", Value::Integer(79)));
        assert_eq!(
            parse_assignment("elscata.VABSA = 2.5").unwrap(),
            ("elscata.VABSA", Value::Float(2.5))
        );
        assert_eq!(
            parse_assignment(r#"EV=["10 eV", 100]"#).unwrap().1,
            Value::List(vec![Value::from("10 eV"), Value::Integer(100)])
        );
    }

    #[test]
    fn bare_words_fall_back_to_text() {
        assert_eq!(
            parse_assignment("VABSD=-1 eV").unwrap().1,
            Value::Text("-1 eV".into())
        );
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        assert_eq!(
            parse_assignment("IZ"),
            Err(ParseError::MissingEquals("IZ".into()))
        );
        assert_eq!(
            parse_assignment(" =3"),
            Err(ParseError::EmptyKey(" =3".into()))
        );
    }
}

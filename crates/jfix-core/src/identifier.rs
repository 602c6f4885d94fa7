//! Java identifier rules shared by configuration validation and name suggestion.

/// Reserved words and literals that can never be used as a variable name.
#[must_use]
pub fn is_java_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "abstract"
            | "assert"
            | "boolean"
            | "break"
            | "byte"
            | "case"
            | "catch"
            | "char"
            | "class"
            | "const"
            | "continue"
            | "default"
            | "do"
            | "double"
            | "else"
            | "enum"
            | "extends"
            | "false"
            | "final"
            | "finally"
            | "float"
            | "for"
            | "goto"
            | "if"
            | "implements"
            | "import"
            | "instanceof"
            | "int"
            | "interface"
            | "long"
            | "native"
            | "new"
            | "null"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "return"
            | "short"
            | "static"
            | "strictfp"
            | "super"
            | "switch"
            | "synchronized"
            | "this"
            | "throw"
            | "throws"
            | "transient"
            | "true"
            | "try"
            | "void"
            | "volatile"
            | "while"
    )
}

/// ASCII subset of the JLS identifier grammar, excluding keywords.
#[must_use]
pub fn is_java_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    if ident == "_" {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') && !is_java_keyword(ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_java_identifier("element"));
        assert!(is_java_identifier("$tmp1"));
        assert!(!is_java_identifier(""));
        assert!(!is_java_identifier("_"));
        assert!(!is_java_identifier("1st"));
        assert!(!is_java_identifier("for"));
        assert!(!is_java_identifier("null"));
        assert!(!is_java_identifier("my-name"));
    }
}

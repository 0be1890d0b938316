//! Lexical tokens of a PHP file

/// Kind tag of a token
///
/// Names follow the PHP tokenizer constants. Single character punctuation
/// (`(`, `,`, `;`, `=` ...) is [`TokenKind::Punct`] and is told apart by its
/// content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    OpenTag,
    OpenTagWithEcho,
    CloseTag,
    InlineHtml,
    Whitespace,
    Comment,
    DocComment,
    /// `$name`
    Variable,
    /// Bare identifier, including `true`, `false`, `null`, `self`, `parent`
    String,
    /// Single quoted or non-interpolated double quoted string
    ConstantEncapsedString,
    /// Integer literal
    LNumber,
    /// Float literal
    DNumber,
    /// Whole nowdoc, or heredoc without interpolation
    Heredoc,
    /// `<<<LABEL` and its line break opening an interpolated heredoc
    StartHeredoc,
    /// Closing label of an interpolated heredoc, with its indentation
    EndHeredoc,
    /// Literal text between interpolations of a double quoted string
    EncapsedAndWhitespace,
    /// `"` delimiting an interpolated string
    DoubleQuote,
    /// `{$` inside an interpolated string
    CurlyOpen,
    /// `}` closing a [`TokenKind::CurlyOpen`]
    CurlyClose,
    /// `${` inside an interpolated string
    DollarOpenCurlyBraces,
    /// `}` closing a [`TokenKind::DollarOpenCurlyBraces`]
    DollarCloseCurlyBraces,
    /// Name inside `${name}`
    StringVarname,
    NsSeparator,
    DoubleColon,
    DoubleArrow,
    ObjectOperator,
    NullsafeObjectOperator,
    /// Multi character operator (`===`, `+=`, `??` ...)
    Operator,
    /// Single character punctuation
    Punct,
    /// `[` opening a short array literal
    ArraySquareBraceOpen,
    ArraySquareBraceClose,
    /// `[` opening a destructuring target (`[$a, $b] = ...`)
    DestructuringSquareBraceOpen,
    DestructuringSquareBraceClose,
    /// `::class`
    ClassConstant,
    Function,
    Fn,
    Use,
    /// `use` of a closure (`function () use ($a)`)
    UseLambda,
    New,
    Class,
    Interface,
    Trait,
    Static,
    Public,
    Protected,
    Private,
    Var,
    Readonly,
    /// Any other reserved word
    Keyword,
}

impl TokenKind {
    /// Whitespace, comments and doc comments
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment)
    }
}

/// A single lexical unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    content: String,
}

impl Token {
    pub fn new(kind: TokenKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    /// Single character punctuation token
    pub fn punct(content: impl Into<String>) -> Self {
        Self::new(TokenKind::Punct, content)
    }

    pub fn whitespace(content: impl Into<String>) -> Self {
        Self::new(TokenKind::Whitespace, content)
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self::new(TokenKind::Comment, content)
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_any_kind(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }

    /// Punctuation with exactly this text
    pub fn equals(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.content == punct
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::DocComment)
    }

    /// Not whitespace and not a comment
    pub fn is_meaningful(&self) -> bool {
        !self.kind.is_trivia()
    }

    pub fn matches(&self, pattern: &Pattern<'_>) -> bool {
        match *pattern {
            Pattern::Punct(text) => self.equals(text),
            Pattern::Kind(kind) => self.kind == kind,
            Pattern::Exact(kind, text) => self.kind == kind && self.content == text,
        }
    }

    pub fn matches_any(&self, patterns: &[Pattern<'_>]) -> bool {
        patterns.iter().any(|p| self.matches(p))
    }
}

/// Token prototype used for matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern<'a> {
    /// Punctuation with the given text
    Punct(&'a str),
    /// Any token of the kind
    Kind(TokenKind),
    /// Token of the kind with exactly this content
    Exact(TokenKind, &'a str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_only_matches_punctuation() {
        assert!(Token::punct("[").equals("["));
        assert!(!Token::new(TokenKind::ArraySquareBraceOpen, "[").equals("["));
        assert!(!Token::new(TokenKind::CurlyClose, "}").equals("}"));
    }

    #[test]
    fn test_patterns() {
        let token = Token::comment("/* x */");
        assert!(token.matches(&Pattern::Kind(TokenKind::Comment)));
        assert!(token.matches(&Pattern::Exact(TokenKind::Comment, "/* x */")));
        assert!(!token.matches(&Pattern::Exact(TokenKind::Comment, "/* y */")));
        assert!(token.matches_any(&[Pattern::Punct(","), Pattern::Kind(TokenKind::Comment)]));
        assert!(!token.is_meaningful());
    }
}

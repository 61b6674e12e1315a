use serde::Serialize;

/// Token kinds produced by the scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum SyntaxKind {
    Unknown,
    EndOfFile,
    Newline,
    Semicolon,

    // Names and literals
    /// Lowercase identifier; may end in `?` or `!`.
    Identifier,
    /// Uppercase-initial name.
    Constant,
    InstanceVariable,
    ClassVariable,
    GlobalVariable,
    IntegerLiteral,
    FloatLiteral,
    /// Double-quoted string; interpolation segments are available on the scanner.
    StringLiteral,
    /// Single-quoted string.
    RawStringLiteral,
    SymbolLiteral,
    RegexLiteral,

    // Keywords
    AndKeyword,
    BeginKeyword,
    BreakKeyword,
    CaseKeyword,
    ClassKeyword,
    DefKeyword,
    DoKeyword,
    ElseKeyword,
    ElsifKeyword,
    EndKeyword,
    EnsureKeyword,
    FalseKeyword,
    IfKeyword,
    InKeyword,
    ModuleKeyword,
    NextKeyword,
    NilKeyword,
    NotKeyword,
    OrKeyword,
    RescueKeyword,
    ReturnKeyword,
    SelfKeyword,
    SuperKeyword,
    ThenKeyword,
    TrueKeyword,
    UnlessKeyword,
    UntilKeyword,
    WhenKeyword,
    WhileKeyword,
    YieldKeyword,

    // Punctuation
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Dot,
    /// `&.`
    SafeNavigation,
    DotDot,
    DotDotDot,
    Colon,
    ColonColon,
    Question,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Bang,
    Tilde,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Lt,
    LtEq,
    LtLt,
    Gt,
    GtEq,
    Spaceship,
    Eq,
    EqEq,
    EqEqEq,
    BangEq,
    EqTilde,
    BangTilde,

    // Assignment operators
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    StarStarEq,
    PipePipeEq,
    AmpAmpEq,
    LtLtEq,
}

impl SyntaxKind {
    pub fn is_keyword(self) -> bool {
        (self as u8) >= (SyntaxKind::AndKeyword as u8) && (self as u8) <= (SyntaxKind::YieldKeyword as u8)
    }

    pub fn is_assignment_operator(self) -> bool {
        matches!(
            self,
            SyntaxKind::PlusEq
                | SyntaxKind::MinusEq
                | SyntaxKind::StarEq
                | SyntaxKind::SlashEq
                | SyntaxKind::PercentEq
                | SyntaxKind::StarStarEq
                | SyntaxKind::PipePipeEq
                | SyntaxKind::AmpAmpEq
                | SyntaxKind::LtLtEq
        )
    }

    /// Tokens after which a line break does not end the statement.
    pub fn continues_line(self) -> bool {
        matches!(
            self,
            SyntaxKind::Comma
                | SyntaxKind::Dot
                | SyntaxKind::SafeNavigation
                | SyntaxKind::OpenParen
                | SyntaxKind::OpenBracket
                | SyntaxKind::OpenBrace
                | SyntaxKind::ColonColon
                | SyntaxKind::Arrow
                | SyntaxKind::FatArrow
                | SyntaxKind::Plus
                | SyntaxKind::Minus
                | SyntaxKind::Star
                | SyntaxKind::StarStar
                | SyntaxKind::Slash
                | SyntaxKind::Percent
                | SyntaxKind::AmpAmp
                | SyntaxKind::PipePipe
                | SyntaxKind::Caret
                | SyntaxKind::LtEq
                | SyntaxKind::LtLt
                | SyntaxKind::GtEq
                | SyntaxKind::Spaceship
                | SyntaxKind::Eq
                | SyntaxKind::EqEq
                | SyntaxKind::EqEqEq
                | SyntaxKind::BangEq
                | SyntaxKind::EqTilde
                | SyntaxKind::BangTilde
                | SyntaxKind::AndKeyword
                | SyntaxKind::OrKeyword
                | SyntaxKind::NotKeyword
        ) || self.is_assignment_operator()
    }

    /// Tokens that end an operand. A `/` after one of these is division,
    /// otherwise it starts a regex.
    pub fn ends_operand(self) -> bool {
        matches!(
            self,
            SyntaxKind::Identifier
                | SyntaxKind::Constant
                | SyntaxKind::InstanceVariable
                | SyntaxKind::ClassVariable
                | SyntaxKind::GlobalVariable
                | SyntaxKind::IntegerLiteral
                | SyntaxKind::FloatLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::RawStringLiteral
                | SyntaxKind::SymbolLiteral
                | SyntaxKind::RegexLiteral
                | SyntaxKind::CloseParen
                | SyntaxKind::CloseBracket
                | SyntaxKind::CloseBrace
                | SyntaxKind::EndKeyword
                | SyntaxKind::SelfKeyword
                | SyntaxKind::NilKeyword
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
        )
    }

    /// Source spelling for punctuation and keywords, used in diagnostics.
    pub fn text(self) -> &'static str {
        match self {
            SyntaxKind::Unknown => "unknown",
            SyntaxKind::EndOfFile => "end of file",
            SyntaxKind::Newline => "newline",
            SyntaxKind::Semicolon => ";",
            SyntaxKind::Identifier => "identifier",
            SyntaxKind::Constant => "constant",
            SyntaxKind::InstanceVariable => "instance variable",
            SyntaxKind::ClassVariable => "class variable",
            SyntaxKind::GlobalVariable => "global variable",
            SyntaxKind::IntegerLiteral => "integer",
            SyntaxKind::FloatLiteral => "float",
            SyntaxKind::StringLiteral | SyntaxKind::RawStringLiteral => "string",
            SyntaxKind::SymbolLiteral => "symbol",
            SyntaxKind::RegexLiteral => "regex",
            SyntaxKind::AndKeyword => "and",
            SyntaxKind::BeginKeyword => "begin",
            SyntaxKind::BreakKeyword => "break",
            SyntaxKind::CaseKeyword => "case",
            SyntaxKind::ClassKeyword => "class",
            SyntaxKind::DefKeyword => "def",
            SyntaxKind::DoKeyword => "do",
            SyntaxKind::ElseKeyword => "else",
            SyntaxKind::ElsifKeyword => "elsif",
            SyntaxKind::EndKeyword => "end",
            SyntaxKind::EnsureKeyword => "ensure",
            SyntaxKind::FalseKeyword => "false",
            SyntaxKind::IfKeyword => "if",
            SyntaxKind::InKeyword => "in",
            SyntaxKind::ModuleKeyword => "module",
            SyntaxKind::NextKeyword => "next",
            SyntaxKind::NilKeyword => "nil",
            SyntaxKind::NotKeyword => "not",
            SyntaxKind::OrKeyword => "or",
            SyntaxKind::RescueKeyword => "rescue",
            SyntaxKind::ReturnKeyword => "return",
            SyntaxKind::SelfKeyword => "self",
            SyntaxKind::SuperKeyword => "super",
            SyntaxKind::ThenKeyword => "then",
            SyntaxKind::TrueKeyword => "true",
            SyntaxKind::UnlessKeyword => "unless",
            SyntaxKind::UntilKeyword => "until",
            SyntaxKind::WhenKeyword => "when",
            SyntaxKind::WhileKeyword => "while",
            SyntaxKind::YieldKeyword => "yield",
            SyntaxKind::OpenParen => "(",
            SyntaxKind::CloseParen => ")",
            SyntaxKind::OpenBracket => "[",
            SyntaxKind::CloseBracket => "]",
            SyntaxKind::OpenBrace => "{",
            SyntaxKind::CloseBrace => "}",
            SyntaxKind::Comma => ",",
            SyntaxKind::Dot => ".",
            SyntaxKind::SafeNavigation => "&.",
            SyntaxKind::DotDot => "..",
            SyntaxKind::DotDotDot => "...",
            SyntaxKind::Colon => ":",
            SyntaxKind::ColonColon => "::",
            SyntaxKind::Question => "?",
            SyntaxKind::Arrow => "->",
            SyntaxKind::FatArrow => "=>",
            SyntaxKind::Plus => "+",
            SyntaxKind::Minus => "-",
            SyntaxKind::Star => "*",
            SyntaxKind::StarStar => "**",
            SyntaxKind::Slash => "/",
            SyntaxKind::Percent => "%",
            SyntaxKind::Bang => "!",
            SyntaxKind::Tilde => "~",
            SyntaxKind::Amp => "&",
            SyntaxKind::AmpAmp => "&&",
            SyntaxKind::Pipe => "|",
            SyntaxKind::PipePipe => "||",
            SyntaxKind::Caret => "^",
            SyntaxKind::Lt => "<",
            SyntaxKind::LtEq => "<=",
            SyntaxKind::LtLt => "<<",
            SyntaxKind::Gt => ">",
            SyntaxKind::GtEq => ">=",
            SyntaxKind::Spaceship => "<=>",
            SyntaxKind::Eq => "=",
            SyntaxKind::EqEq => "==",
            SyntaxKind::EqEqEq => "===",
            SyntaxKind::BangEq => "!=",
            SyntaxKind::EqTilde => "=~",
            SyntaxKind::BangTilde => "!~",
            SyntaxKind::PlusEq => "+=",
            SyntaxKind::MinusEq => "-=",
            SyntaxKind::StarEq => "*=",
            SyntaxKind::SlashEq => "/=",
            SyntaxKind::PercentEq => "%=",
            SyntaxKind::StarStarEq => "**=",
            SyntaxKind::PipePipeEq => "||=",
            SyntaxKind::AmpAmpEq => "&&=",
            SyntaxKind::LtLtEq => "<<=",
        }
    }
}

/// Map reserved words to keyword kinds.
pub fn keyword_kind(text: &str) -> Option<SyntaxKind> {
    let kind = match text {
        "and" => SyntaxKind::AndKeyword,
        "begin" => SyntaxKind::BeginKeyword,
        "break" => SyntaxKind::BreakKeyword,
        "case" => SyntaxKind::CaseKeyword,
        "class" => SyntaxKind::ClassKeyword,
        "def" => SyntaxKind::DefKeyword,
        "do" => SyntaxKind::DoKeyword,
        "else" => SyntaxKind::ElseKeyword,
        "elsif" => SyntaxKind::ElsifKeyword,
        "end" => SyntaxKind::EndKeyword,
        "ensure" => SyntaxKind::EnsureKeyword,
        "false" => SyntaxKind::FalseKeyword,
        "if" => SyntaxKind::IfKeyword,
        "in" => SyntaxKind::InKeyword,
        "module" => SyntaxKind::ModuleKeyword,
        "next" => SyntaxKind::NextKeyword,
        "nil" => SyntaxKind::NilKeyword,
        "not" => SyntaxKind::NotKeyword,
        "or" => SyntaxKind::OrKeyword,
        "rescue" => SyntaxKind::RescueKeyword,
        "return" => SyntaxKind::ReturnKeyword,
        "self" => SyntaxKind::SelfKeyword,
        "super" => SyntaxKind::SuperKeyword,
        "then" => SyntaxKind::ThenKeyword,
        "true" => SyntaxKind::TrueKeyword,
        "unless" => SyntaxKind::UnlessKeyword,
        "until" => SyntaxKind::UntilKeyword,
        "when" => SyntaxKind::WhenKeyword,
        "while" => SyntaxKind::WhileKeyword,
        "yield" => SyntaxKind::YieldKeyword,
        _ => return None,
    };
    Some(kind)
}

//! Node kinds for the Dockerfile/shell syntax tree
//!
//! One variant per concrete syntax kind. Value kinds (leaves that carry a
//! scalar string) hold it directly; structural kinds carry nothing and expose
//! their parts through child nodes. Every kind has a stable upper-case tag
//! (`DOCKER-RUN`, `BASH-COMMAND`, ...) which is what queries match against.

use std::fmt;

/// Syntax kind of a node, with the payload value kinds need
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // ==================
    // Dockerfile structure
    // ==================
    /// Root of a parsed Dockerfile
    DockerFile,
    /// `# ...` line at instruction level (also parser directives)
    DockerComment(String),
    /// Instruction keyword as written (`RUN`, `run`, `AS`, `NONE`)
    DockerKeyword(String),
    /// Instruction flag such as `--from=builder`
    DockerFlag(String),
    DockerFrom,
    DockerImageName(String),
    DockerImageTag(String),
    DockerImageDigest(String),
    DockerImageAlias(String),
    DockerRun,
    DockerCmd,
    DockerEntrypoint,
    DockerShell,
    /// JSON array form (`["a", "b"]`)
    DockerExecForm,
    /// Decoded JSON string element of an exec form
    DockerJsonString(String),
    DockerCopy,
    DockerAdd,
    DockerPath(String),
    DockerEnv,
    DockerArg,
    DockerLabel,
    /// `key=value` pair of ENV/ARG/LABEL
    DockerKeyValue,
    DockerName(String),
    DockerLiteral(String),
    DockerExpose,
    DockerPort(String),
    DockerWorkdir,
    DockerUser,
    DockerVolume,
    DockerStopSignal,
    DockerHealthcheck,
    DockerOnbuild,
    DockerMaintainer,
    /// Instruction with an unknown keyword; arguments kept raw
    DockerInstruction,

    // ==================
    // Shell structure
    // ==================
    /// Root of an embedded shell script (scope root for intra-directive rules)
    BashScript,
    BashComment(String),
    /// Statement terminator: `;`, `&` or `;;`
    BashTerminator(String),
    /// Operator token: `&&`, `||`, `|`, `|&`, `!`, redirection operators
    BashOperator(String),
    BashAndIf,
    BashOrIf,
    BashPipeline,
    /// Simple command
    BashCommand,
    /// Wrapper around the word naming the command
    BashCommandCommand,
    /// Wrapper around the argument words of a command
    BashCommandArgs,
    BashAssignment,
    BashName(String),
    BashRedirect,
    BashWord,
    BashLiteral(String),
    BashSingleQuoted,
    BashDoubleQuoted,
    /// `$NAME`, `$1`, `$@`; the value keeps the `$`
    BashVariable(String),
    /// `${...}` as written
    BashBracedVariable(String),
    /// `$( ... )`
    BashCommandSubstitution,
    /// `` `...` ``
    BashBacktickSubstitution,
    /// `$(( ... ))` as written
    BashArithmetic(String),
    BashSubshell,
    BashBraceGroup,
    BashIf,
    BashCondition,
    BashThen,
    BashElif,
    BashElse,
    BashFor,
    BashForIn,
    BashDoGroup,
    BashWhile,
    BashUntil,
    BashCase,
    BashCaseItem,
    BashCasePattern,
    BashFunction,

    // ==================
    // Analysis-only kinds (never produced by the parser)
    // ==================
    /// Opaque `TYPE:VALUE` token produced by abstraction
    AbstractIdentity(String),
    /// Value-taking flag merged with its value by an enricher
    OptionGroup,
}

impl NodeKind {
    /// Stable tag used by queries and the JSON dump
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::DockerFile => "DOCKER-FILE",
            Self::DockerComment(_) => "DOCKER-COMMENT",
            Self::DockerKeyword(_) => "DOCKER-KEYWORD",
            Self::DockerFlag(_) => "DOCKER-FLAG",
            Self::DockerFrom => "DOCKER-FROM",
            Self::DockerImageName(_) => "DOCKER-IMAGE-NAME",
            Self::DockerImageTag(_) => "DOCKER-IMAGE-TAG",
            Self::DockerImageDigest(_) => "DOCKER-IMAGE-DIGEST",
            Self::DockerImageAlias(_) => "DOCKER-IMAGE-ALIAS",
            Self::DockerRun => "DOCKER-RUN",
            Self::DockerCmd => "DOCKER-CMD",
            Self::DockerEntrypoint => "DOCKER-ENTRYPOINT",
            Self::DockerShell => "DOCKER-SHELL",
            Self::DockerExecForm => "DOCKER-EXEC-FORM",
            Self::DockerJsonString(_) => "DOCKER-JSON-STRING",
            Self::DockerCopy => "DOCKER-COPY",
            Self::DockerAdd => "DOCKER-ADD",
            Self::DockerPath(_) => "DOCKER-PATH",
            Self::DockerEnv => "DOCKER-ENV",
            Self::DockerArg => "DOCKER-ARG",
            Self::DockerLabel => "DOCKER-LABEL",
            Self::DockerKeyValue => "DOCKER-KEY-VALUE",
            Self::DockerName(_) => "DOCKER-NAME",
            Self::DockerLiteral(_) => "DOCKER-LITERAL",
            Self::DockerExpose => "DOCKER-EXPOSE",
            Self::DockerPort(_) => "DOCKER-PORT",
            Self::DockerWorkdir => "DOCKER-WORKDIR",
            Self::DockerUser => "DOCKER-USER",
            Self::DockerVolume => "DOCKER-VOLUME",
            Self::DockerStopSignal => "DOCKER-STOPSIGNAL",
            Self::DockerHealthcheck => "DOCKER-HEALTHCHECK",
            Self::DockerOnbuild => "DOCKER-ONBUILD",
            Self::DockerMaintainer => "DOCKER-MAINTAINER",
            Self::DockerInstruction => "DOCKER-INSTRUCTION",
            Self::BashScript => "BASH-SCRIPT",
            Self::BashComment(_) => "BASH-COMMENT",
            Self::BashTerminator(_) => "BASH-TERMINATOR",
            Self::BashOperator(_) => "BASH-OPERATOR",
            Self::BashAndIf => "BASH-AND-IF",
            Self::BashOrIf => "BASH-OR-IF",
            Self::BashPipeline => "BASH-PIPELINE",
            Self::BashCommand => "BASH-COMMAND",
            Self::BashCommandCommand => "BASH-COMMAND-COMMAND",
            Self::BashCommandArgs => "BASH-COMMAND-ARGS",
            Self::BashAssignment => "BASH-ASSIGNMENT",
            Self::BashName(_) => "BASH-NAME",
            Self::BashRedirect => "BASH-REDIRECT",
            Self::BashWord => "BASH-WORD",
            Self::BashLiteral(_) => "BASH-LITERAL",
            Self::BashSingleQuoted => "BASH-SINGLE-QUOTED",
            Self::BashDoubleQuoted => "BASH-DOUBLE-QUOTED",
            Self::BashVariable(_) => "BASH-VARIABLE",
            Self::BashBracedVariable(_) => "BASH-BRACED-VARIABLE",
            Self::BashCommandSubstitution => "BASH-COMMAND-SUBSTITUTION",
            Self::BashBacktickSubstitution => "BASH-BACKTICK-SUBSTITUTION",
            Self::BashArithmetic(_) => "BASH-ARITHMETIC",
            Self::BashSubshell => "BASH-SUBSHELL",
            Self::BashBraceGroup => "BASH-BRACE-GROUP",
            Self::BashIf => "BASH-IF",
            Self::BashCondition => "BASH-CONDITION",
            Self::BashThen => "BASH-THEN",
            Self::BashElif => "BASH-ELIF",
            Self::BashElse => "BASH-ELSE",
            Self::BashFor => "BASH-FOR",
            Self::BashForIn => "BASH-FOR-IN",
            Self::BashDoGroup => "BASH-DO-GROUP",
            Self::BashWhile => "BASH-WHILE",
            Self::BashUntil => "BASH-UNTIL",
            Self::BashCase => "BASH-CASE",
            Self::BashCaseItem => "BASH-CASE-ITEM",
            Self::BashCasePattern => "BASH-CASE-PATTERN",
            Self::BashFunction => "BASH-FUNCTION",
            Self::AbstractIdentity(_) => "ABSTRACT-IDENTITY",
            Self::OptionGroup => "SC-OPTION-GROUP",
        }
    }

    /// Scalar value of a value kind
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::DockerComment(v)
            | Self::DockerKeyword(v)
            | Self::DockerFlag(v)
            | Self::DockerImageName(v)
            | Self::DockerImageTag(v)
            | Self::DockerImageDigest(v)
            | Self::DockerImageAlias(v)
            | Self::DockerJsonString(v)
            | Self::DockerPath(v)
            | Self::DockerName(v)
            | Self::DockerLiteral(v)
            | Self::DockerPort(v)
            | Self::BashComment(v)
            | Self::BashTerminator(v)
            | Self::BashOperator(v)
            | Self::BashName(v)
            | Self::BashLiteral(v)
            | Self::BashVariable(v)
            | Self::BashBracedVariable(v)
            | Self::BashArithmetic(v)
            | Self::AbstractIdentity(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn value_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::DockerComment(v)
            | Self::DockerKeyword(v)
            | Self::DockerFlag(v)
            | Self::DockerImageName(v)
            | Self::DockerImageTag(v)
            | Self::DockerImageDigest(v)
            | Self::DockerImageAlias(v)
            | Self::DockerJsonString(v)
            | Self::DockerPath(v)
            | Self::DockerName(v)
            | Self::DockerLiteral(v)
            | Self::DockerPort(v)
            | Self::BashComment(v)
            | Self::BashTerminator(v)
            | Self::BashOperator(v)
            | Self::BashName(v)
            | Self::BashLiteral(v)
            | Self::BashVariable(v)
            | Self::BashBracedVariable(v)
            | Self::BashArithmetic(v)
            | Self::AbstractIdentity(v) => Some(v),
            _ => None,
        }
    }

    /// Whether this kind is a leaf carrying a scalar value
    pub fn is_value(&self) -> bool {
        self.value().is_some()
    }

    /// Top-level Dockerfile instruction kinds
    pub const fn is_instruction(&self) -> bool {
        matches!(
            self,
            Self::DockerFrom
                | Self::DockerRun
                | Self::DockerCmd
                | Self::DockerEntrypoint
                | Self::DockerShell
                | Self::DockerCopy
                | Self::DockerAdd
                | Self::DockerEnv
                | Self::DockerArg
                | Self::DockerLabel
                | Self::DockerExpose
                | Self::DockerWorkdir
                | Self::DockerUser
                | Self::DockerVolume
                | Self::DockerStopSignal
                | Self::DockerHealthcheck
                | Self::DockerOnbuild
                | Self::DockerMaintainer
                | Self::DockerInstruction
        )
    }

    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::DockerComment(_) | Self::BashComment(_))
    }

    /// Kinds that hold a statement list as their children
    pub const fn is_statement_list(&self) -> bool {
        matches!(
            self,
            Self::BashScript
                | Self::BashCommandSubstitution
                | Self::BashBacktickSubstitution
                | Self::BashSubshell
                | Self::BashBraceGroup
                | Self::BashCondition
                | Self::BashThen
                | Self::BashElse
                | Self::BashDoGroup
        )
    }

    /// Kinds that exist only in enriched/abstracted clones
    pub const fn is_analysis_only(&self) -> bool {
        matches!(self, Self::AbstractIdentity(_) | Self::OptionGroup)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Stream tree edges while the tree is built.
    Edges,
    /// Print the distance matrix extended with the internal nodes.
    Matrix,
    /// Print the tree in Newick format, optionally rooted at a chosen outlier.
    Newick { outlier: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Run(Mode),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid arguments: {msg}")]
pub struct InvalidArguments {
    pub msg: String,
}

impl InvalidArguments {
    fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Validate the arguments after the program name.
///
/// Accepted forms: none, `-h`, `-m`, `-n`, `-n -o <name>`.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<Command, InvalidArguments> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    match args.as_slice() {
        [] => Ok(Command::Run(Mode::Edges)),
        ["-h"] => Ok(Command::Help),
        ["-m"] => Ok(Command::Run(Mode::Matrix)),
        ["-n"] => Ok(Command::Run(Mode::Newick { outlier: None })),
        ["-n", "-o", name] => Ok(Command::Run(Mode::Newick {
            outlier: Some(name.to_string()),
        })),
        ["-n", "-o"] => Err(InvalidArguments::new("-o requires a taxon name")),
        ["-o", ..] => Err(InvalidArguments::new("-o is only valid after -n")),
        [flag @ ("-h" | "-m" | "-n"), ..] => Err(InvalidArguments::new(format!(
            "unexpected arguments after {flag}"
        ))),
        [other, ..] => Err(InvalidArguments::new(format!(
            "unknown argument '{other}'"
        ))),
    }
}

pub fn usage(prog: &str) -> String {
    format!(
        "USAGE: {prog} [-h] [-m|-n] [-o <name>]
   -h       Help: displays this help menu.
   -m       Matrix: print the distance matrix extended with synthesized nodes.
   -n       Newick: print the tree in Newick format.
   -o name  Outlier: root the Newick tree at the neighbor of taxon <name>;
            requires -n.  By default the taxon farthest from the others is used.

Distance data is read as CSV from standard input. Without -m or -n, each edge
of the tree is printed as `id,id,distance` when it is synthesized.
"
    )
}

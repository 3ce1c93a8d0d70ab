use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use lexica_engine::{
    codec,
    dispatch::{self, HintsQuery, RequestEnvelope, WordsQuery},
    grid, Alphabet, Answer, Dispatcher, Grid, Hints, Query,
};
use log::{debug, error, info};

/// Find the words hidden in a board of letter tiles, and share boards as short tokens.
#[derive(Debug, Parser)]
#[command(version)]
struct Opts {
    /// Comma-separated letter tokens of the board's alphabet.
    /// Defaults to English, with "qu" in place of "q".
    #[arg(short, long, global = true, value_delimiter = ',')]
    alphabet: Option<Vec<String>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every dictionary word that can be traced on a board.
    Solve {
        /// Comma-separated tiles of a square board, row by row.
        #[arg(short, long)]
        board: String,

        /// A word list with one word per line.
        #[arg(short, long)]
        dictionary: PathBuf,

        #[arg(short, long, default_value_t = 3)]
        min_word_length: usize,

        /// Also print every path spelling each word.
        #[arg(long)]
        hints: bool,
    },
    /// Print the token for a board.
    Encode {
        /// Comma-separated tiles of a square board, row by row.
        #[arg(short, long)]
        board: String,
    },
    /// Print the board a token stands for.
    Decode { token: String },
    /// Answer JSON search requests, one per line on stdin, with one JSON response
    /// per line on stdout.
    Serve,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("{}: {source}", .path.display())]
    Dictionary { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Grid(#[from] grid::Error),
    #[error(transparent)]
    Codec(#[from] codec::Error),
    #[error(transparent)]
    Dispatch(#[from] dispatch::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("expected {expected} from the search worker")]
    UnexpectedAnswer { expected: &'static str },
}

fn parse_board(board: &str) -> Result<Grid, grid::Error> {
    Grid::square(board.split(',').map(str::trim))
}

fn load_dictionary(path: PathBuf) -> Result<Vec<String>, Error> {
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(source) => return Err(Error::Dictionary { path, source }),
    };
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect())
}

fn print_grid(grid: &Grid) {
    let letters = grid.letters().collect::<Vec<_>>();
    for row in letters.chunks(grid.columns()) {
        println!("{}", row.join(" "));
    }
}

fn print_hints(hints: &Hints) {
    for (word, paths) in hints {
        let paths = paths
            .iter()
            .map(|path| {
                path.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>();
        println!("{word}: {}", paths.join(" | "));
    }
}

fn solve(
    board: Grid,
    dictionary: Vec<String>,
    min_word_length: usize,
    hints: bool,
) -> Result<(), Error> {
    let dispatcher = Dispatcher::spawn();

    let words = match dispatcher
        .submit(Query::Words(WordsQuery {
            board: board.clone(),
            dictionary,
            min_word_length,
        }))
        .wait()?
    {
        Answer::Words(words) => words,
        Answer::Hints(_) => return Err(Error::UnexpectedAnswer { expected: "words" }),
    };
    info!("{} words on the board", words.len());

    if !hints {
        for word in &words {
            println!("{word}");
        }
        return Ok(());
    }

    let hints = match dispatcher
        .submit(Query::Hints(HintsQuery {
            board,
            words_on_board: words.into_iter().collect(),
        }))
        .wait()?
    {
        Answer::Hints(hints) => hints,
        Answer::Words(_) => return Err(Error::UnexpectedAnswer { expected: "hints" }),
    };
    print_hints(&hints);

    dispatcher.shutdown();
    Ok(())
}

fn serve() -> Result<(), Error> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let envelope = match serde_json::from_str::<RequestEnvelope>(&line) {
            Ok(envelope) => envelope,
            Err(err) => {
                error!("skipping unreadable request: {err}");
                continue;
            }
        };

        let response = dispatch::handle(envelope);
        serde_json::to_writer(&mut out, &response)?;
        writeln!(out)?;
        out.flush()?;
    }

    Ok(())
}

fn run(opts: Opts) -> Result<(), Error> {
    let alphabet = opts.alphabet.map(Alphabet::new).unwrap_or_else(Alphabet::english);

    match opts.command {
        Command::Solve {
            board,
            dictionary,
            min_word_length,
            hints,
        } => {
            let board = parse_board(&board)?;
            let dictionary = load_dictionary(dictionary)?;
            debug!("loaded {} dictionary words", dictionary.len());
            solve(board, dictionary, min_word_length, hints)
        }
        Command::Encode { board } => {
            let board = parse_board(&board)?;
            println!("{}", codec::encode_grid(&board, &alphabet)?);
            Ok(())
        }
        Command::Decode { token } => {
            print_grid(&codec::decode_grid(&token, &alphabet)?);
            Ok(())
        }
        Command::Serve => serve(),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let opts = Opts::parse();
    debug!("command line options: {opts:?}");

    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

use std::fmt::{Display, Formatter};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use crate::check::check_cmd;
use crate::index::index_cmd;
use crate::new_post::new_cmd;

#[path = "../folio/config.rs"]
mod config;
mod check;
mod index;
mod new_post;

const CFG_FILE_NAME: &str = "folio.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
enum Args {
    /// Scaffolds a new post
    New(NewArgs),
    /// Loads and renders every content file, drafts included
    Check(SiteArgs),
    /// Pushes published posts to the search index
    Index(SiteArgs),
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct NewArgs {
    /// Title of the post
    #[arg(short, long)]
    title: String,

    /// Name of the author. If empty, OS user real name is being used
    #[arg(short, long)]
    author: Option<String>,

    /// Category of the post
    #[arg(short, long, default_value = "general")]
    category: String,

    /// Where the new post goes
    #[arg(short, long, default_value_t = PostOutput::Stdout)]
    output: PostOutput,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct SiteArgs {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,
}

#[derive(Clone, Debug, ValueEnum)]
enum PostOutput {
    /// Writes the new post content to the stdout
    Stdout,
    /// Writes the new post to `<slug>.mdx` in the current directory
    File,
    /// Writes the new post to `<slug>/index.mdx` (posts with images)
    Dir,
}

impl Display for PostOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PostOutput::Stdout => write!(f, "stdout"),
            PostOutput::File => write!(f, "file"),
            PostOutput::Dir => write!(f, "dir"),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args {
        Args::New(args) => new_cmd(args),
        Args::Check(args) => check_cmd(args),
        Args::Index(args) => index_cmd(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

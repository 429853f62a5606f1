use std::{
    error::Error,
    path::PathBuf,
};

use clap::{
    Parser,
    ValueEnum,
};
use dircap::{
    EvictionStrategy,
    NameAscending,
    OldestFirst,
};

use crate::utils;

#[derive(Clone, ValueEnum, PartialEq, Eq, Debug)]
pub enum ArgStrategy {
    OldestFirst,
    NameAscending,
}

impl ArgStrategy {
    pub fn create(&self) -> Box<dyn EvictionStrategy> {
        match self {
            Self::OldestFirst => Box::new(OldestFirst::new()),
            Self::NameAscending => Box::new(NameAscending::new()),
        }
    }
}

/// One folder registration from the command line.
#[derive(Clone, Debug)]
pub struct FolderSpec {
    pub location: PathBuf,
    pub max_size: u64,
}

impl FolderSpec {
    pub fn parse_arg(value: &str) -> Result<FolderSpec, Box<dyn Error + Send + Sync>> {
        let Some((location, size)) = value.rsplit_once('=') else {
            return Err("expected <path>=<max size>".into());
        };

        Ok(FolderSpec {
            location: PathBuf::from(location),
            max_size: utils::parse_size(size)?,
        })
    }
}

/// Keep a set of folders below configured size quotas
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Folders to manage, given as <path>=<max size> pairs.
    /// A max size of 0 disables the quota for that folder.
    ///
    /// Sizes accept B, KB, MB and GB suffixes:
    /// -f /var/cache/thumbs=500MB -f /tmp/scratch=0
    #[arg(value_parser = FolderSpec::parse_arg, short, long = "folder", verbatim_doc_comment)]
    pub folder: Vec<FolderSpec>,

    /// Seconds between periodic re-checks of every managed folder.
    #[arg(short, long, default_value_t = 30)]
    pub interval: u64,

    /// Only count and evict files with these extensions.
    #[arg(short, long = "ext")]
    pub ext: Vec<String>,

    /// How files are picked for eviction once a folder runs over quota.
    #[arg(short, long, value_enum, default_value = "oldest-first")]
    pub strategy: ArgStrategy,

    /// Display the log in the terminal as a split screen.
    #[arg(long)]
    pub ui_logger: bool,
}

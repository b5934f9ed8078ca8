//! Folder policy resolution
//!
//! Decides how an existing output folder is treated before a crawl starts.
//! The result is either an [`ExportMode`] for the core or a request to abort,
//! in which case nothing is crawled.

use crate::export::ExportMode;
use clap::ValueEnum;
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

/// What to do when the output folder already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FolderPolicy {
    /// Prompt on stdin
    Ask,
    /// Re-write every page
    Overwrite,
    /// Keep old files, add a new version when a page changed
    Append,
    /// Only write pages that have never been archived
    Skip,
    /// Replace the file of a page that changed
    Update,
    /// Leave the folder alone and exit
    Abort,
}

impl FolderPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderPolicy::Ask => "ask",
            FolderPolicy::Overwrite => "overwrite",
            FolderPolicy::Append => "append",
            FolderPolicy::Skip => "skip",
            FolderPolicy::Update => "update",
            FolderPolicy::Abort => "abort",
        }
    }
}

impl fmt::Display for FolderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FolderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(FolderPolicy::Ask),
            "overwrite" | "o" => Ok(FolderPolicy::Overwrite),
            "append" | "a" => Ok(FolderPolicy::Append),
            "skip" | "s" => Ok(FolderPolicy::Skip),
            "update" | "u" => Ok(FolderPolicy::Update),
            "abort" | "q" => Ok(FolderPolicy::Abort),
            other => Err(format!("unknown folder policy '{}'", other)),
        }
    }
}

/// Resolves a policy into an export mode
///
/// A missing folder always resolves to append: every page is new.
/// `ask` calls `prompt` to pick one of the other policies.
///
/// # Returns
///
/// * `Ok(Some(mode))` - Run the crawl in `mode`
/// * `Ok(None)` - Abort without crawling
/// * `Err(e)` - The prompt failed
pub fn resolve_mode<F>(
    policy: FolderPolicy,
    folder_exists: bool,
    prompt: F,
) -> std::io::Result<Option<ExportMode>>
where
    F: FnOnce() -> std::io::Result<FolderPolicy>,
{
    if !folder_exists {
        return Ok(Some(ExportMode::Append));
    }

    let policy = match policy {
        FolderPolicy::Ask => prompt()?,
        other => other,
    };

    Ok(match policy {
        FolderPolicy::Overwrite => Some(ExportMode::Overwrite),
        FolderPolicy::Append => Some(ExportMode::Append),
        FolderPolicy::Skip => Some(ExportMode::Skip),
        FolderPolicy::Update => Some(ExportMode::Update),
        FolderPolicy::Ask | FolderPolicy::Abort => None,
    })
}

/// Asks on stdin how to treat an existing folder
pub fn prompt_policy(folder: &std::path::Path) -> std::io::Result<FolderPolicy> {
    prompt_policy_with_io(
        folder,
        &mut std::io::stdin().lock(),
        &mut std::io::stdout(),
    )
}

pub(crate) fn prompt_policy_with_io<R, W>(
    folder: &std::path::Path,
    reader: &mut R,
    writer: &mut W,
) -> std::io::Result<FolderPolicy>
where
    R: BufRead,
    W: Write,
{
    writeln!(writer, "Output folder {} already exists.", folder.display())?;
    loop {
        write!(
            writer,
            "[o]verwrite, [a]ppend, [s]kip, [u]pdate or [q]uit? [a]: "
        )?;
        writer.flush()?;

        let mut input = String::new();
        if reader.read_line(&mut input)? == 0 {
            return Ok(FolderPolicy::Abort);
        }

        let answer = input.trim();
        if answer.is_empty() {
            return Ok(FolderPolicy::Append);
        }
        match answer.parse::<FolderPolicy>() {
            Ok(FolderPolicy::Ask) | Err(_) => {
                writeln!(writer, "Please answer o, a, s, u or q.")?;
            }
            Ok(policy) => return Ok(policy),
        }
    }
}

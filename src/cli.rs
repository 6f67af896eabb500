// src/cli.rs

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::path::PathBuf;
use std::time::Duration;
use vanguard_vhost::core::input::load_lines;
use vanguard_vhost::{CompareMode, Options};

/// Discover virtual hosts behind IP addresses by fuzzing the Host header.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Target IP addresses (comma separated or repeated)
    #[clap(short, long, required = true, value_delimiter = ',', num_args = 1..)]
    pub ips: Vec<String>,

    /// Wordlist of hostnames or hostname prefixes
    #[clap(short, long)]
    pub wordlist: PathBuf,

    /// Domain suffixes appended to every wordlist entry
    #[clap(short, long, value_delimiter = ',')]
    pub domains: Vec<String>,

    /// File with one domain suffix per line
    #[clap(long)]
    pub domains_file: Option<PathBuf>,

    /// Paths requested on every target
    #[clap(short, long, value_delimiter = ',', default_value = "/")]
    pub paths: Vec<String>,

    /// Extra request header, `Name: value`
    #[clap(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Port to connect to (defaults to 443 with --tls, 80 otherwise)
    #[clap(long)]
    pub port: Option<u16>,

    /// Use HTTPS
    #[clap(long)]
    pub tls: bool,

    /// Proxy URL for every request
    #[clap(short = 'x', long)]
    pub proxy: Option<String>,

    /// Number of concurrent workers
    #[clap(short, long, default_value_t = 10)]
    pub threads: usize,

    /// Per-request timeout in seconds
    #[clap(long, default_value_t = 5)]
    pub timeout: u64,

    /// Also report candidates identical to the baseline
    #[clap(short, long)]
    pub verbose: bool,

    /// Cross-check hits against the public response of the hostname
    #[clap(long)]
    pub verify: bool,

    /// Comparison: status-length, body-hash, normalized or title
    #[clap(long, default_value = "status-length")]
    pub compare: CompareMode,

    /// Regex removed from bodies before comparison (normalized mode)
    #[clap(long = "ignore")]
    pub ignore_patterns: Vec<String>,

    /// Write every event as JSON Lines to this file
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Show the live dashboard instead of plain output
    #[clap(long)]
    pub tui: bool,
}

impl Args {
    /// Loads the list files and freezes the run options.
    pub async fn into_options(self) -> Result<Options> {
        let wordlist = load_lines(&self.wordlist)
            .await
            .wrap_err_with(|| format!("failed to read wordlist {}", self.wordlist.display()))?;

        let mut domains = self.domains;
        if let Some(path) = &self.domains_file {
            domains.extend(
                load_lines(path)
                    .await
                    .wrap_err_with(|| format!("failed to read domain list {}", path.display()))?,
            );
        }

        Ok(Options {
            domains,
            headers: self.headers,
            ips: self.ips,
            paths: self.paths,
            port: self.port,
            proxy: self.proxy,
            threads: self.threads,
            timeout: Duration::from_secs(self.timeout),
            tls: self.tls,
            verbose: self.verbose,
            verify: self.verify,
            wordlist,
            compare: self.compare,
            ignore_patterns: self.ignore_patterns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_lists_and_defaults() {
        let args = Args::parse_from([
            "vanguard-vhost", "-i", "10.0.0.1,10.0.0.2", "-w", "words.txt", "-d", "example.com",
        ]);
        assert_eq!(args.ips, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(args.paths, vec!["/"]);
        assert_eq!(args.threads, 10);
        assert_eq!(args.compare, CompareMode::StatusLength);
        assert!(!args.tls);
    }

    #[test]
    fn parses_compare_mode() {
        let args = Args::parse_from([
            "vanguard-vhost", "-i", "10.0.0.1", "-w", "w.txt", "--compare", "body-hash",
        ]);
        assert_eq!(args.compare, CompareMode::BodyHash);
    }

    #[tokio::test]
    async fn builds_options_from_files() {
        let mut words = tempfile::NamedTempFile::new().unwrap();
        writeln!(words, "admin\ndev").unwrap();
        let mut suffixes = tempfile::NamedTempFile::new().unwrap();
        writeln!(suffixes, "example.org").unwrap();

        let args = Args::parse_from([
            "vanguard-vhost".to_string(),
            "-i".to_string(),
            "10.0.0.1".to_string(),
            "-w".to_string(),
            words.path().display().to_string(),
            "-d".to_string(),
            "example.com".to_string(),
            "--domains-file".to_string(),
            suffixes.path().display().to_string(),
            "--timeout".to_string(),
            "2".to_string(),
        ]);
        let options = args.into_options().await.unwrap();
        assert_eq!(options.wordlist, vec!["admin", "dev"]);
        assert_eq!(options.domains, vec!["example.com", "example.org"]);
        assert_eq!(options.timeout, Duration::from_secs(2));
    }
}

//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::Parser;

/// Copy secrets from Vault into a Kubernetes Secret.
///
/// Everything else is configured through environment variables: NAMESPACE,
/// VAULT_ADDRESS, VAULT_ROLE, VAULT_AUTH_PATH, SECRET_TARGET and
/// SECRET_SOURCES are required.
#[derive(Parser, Debug)]
#[command(name = "vault-k8s-mapper")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Load variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<Utf8PathBuf>,

    /// Resolve secrets but do not write to the cluster
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "vault-k8s-mapper",
            "-vv",
            "--env-file",
            "deploy/.env",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert_eq!(cli.env_file.as_deref().map(|p| p.as_str()), Some("deploy/.env"));
        assert!(cli.dry_run);
    }
}

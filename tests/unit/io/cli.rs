//! Tests for command-line parsing and command execution

#[cfg(test)]
mod tests {
    use clap::Parser;
    use hypertile::io::cli::{Cli, Command, CommandRunner, run_seed};
    use hypertile::io::configuration::{BackendKind, BootstrapKernel, DEFAULT_SEED};
    use hypertile::spatial::store::WorldStateStore;
    use std::path::Path;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hypertile").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    fn store_args(dir: &Path) -> Vec<String> {
        vec![
            "--store".to_string(),
            dir.display().to_string(),
            "--backend".to_string(),
            "swatch".to_string(),
            "--image-size".to_string(),
            "2".to_string(),
            "-d".to_string(),
            "3".to_string(),
            "-q".to_string(),
        ]
    }

    fn run(dir: &Path, command: &[&str]) -> hypertile::Result<()> {
        let owned = store_args(dir);
        let mut args: Vec<&str> = owned.iter().map(String::as_str).collect();
        args.extend_from_slice(command);
        CommandRunner::new(parse(&args)).run()
    }

    // Tests init parses coordinate pairs, with negatives after the separator
    // Verified by parsing pairs as single numbers
    #[test]
    fn test_parse_init() {
        let cli = parse(&["init", "0,0", "--", "-1.5,2"]);
        let Command::Init { coords } = cli.command else {
            panic!("expected init");
        };
        assert_eq!(coords, vec![[0.0, 0.0], [-1.5, 2.0]]);
    }

    // Tests generate parses a comma-separated context hint
    // Verified by splitting context on whitespace
    #[test]
    fn test_parse_generate_context() {
        let cli = parse(&["generate", "0.5,0.5", "--context", "0,2,3"]);
        let Command::Generate { coords, context } = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(coords, vec![[0.5, 0.5]]);
        assert_eq!(context, Some(vec![0, 2, 3]));
    }

    // Tests malformed invocations are rejected
    // Verified by allowing init without coordinates
    #[test]
    fn test_parse_errors() {
        for args in [
            vec!["hypertile"],
            vec!["hypertile", "init"],
            vec!["hypertile", "init", "1;2"],
            vec!["hypertile", "generate", "0,0", "--context", "a"],
            vec!["hypertile", "--backend", "gan", "show"],
        ] {
            assert!(Cli::try_parse_from(&args).is_err(), "accepted {args:?}");
        }
    }

    // Tests flags override configuration values
    // Verified by ignoring the sigma flag
    #[test]
    fn test_sampler_config_overrides() {
        let cli = parse(&[
            "show",
            "--sigma",
            "2.5",
            "--alpha",
            "0.5",
            "--lengthscale",
            "3",
            "-s",
            "9",
            "--bootstrap-kernel",
            "lengthscale",
            "-b",
            "swatch",
        ]);
        let config = cli.settings.sampler_config().expect("config");
        assert!((config.hyperparameters.sigma - 2.5).abs() < f64::EPSILON);
        assert!((config.hyperparameters.alpha - 0.5).abs() < f64::EPSILON);
        assert!((config.hyperparameters.lengthscale - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.seed, 9);
        assert_eq!(config.bootstrap_kernel, BootstrapKernel::Lengthscale);
        assert_eq!(config.backend, BackendKind::Swatch);
        assert!(cli.settings.should_show_progress());

        let defaults = parse(&["show"]).settings.sampler_config().expect("config");
        assert_eq!(defaults.seed, DEFAULT_SEED);

        let invalid = parse(&["show", "--sigma", "0"]).settings.sampler_config();
        assert!(invalid.is_err());
    }

    // Tests verbosity flags are global and quiet hides progress
    // Verified by reading progress visibility from verbose
    #[test]
    fn test_verbosity_flags() {
        let defaults = parse(&["show"]).settings;
        assert!(!defaults.verbose);
        assert!(!defaults.quiet);
        assert!(defaults.should_show_progress());

        let quiet = parse(&["show", "-q"]).settings;
        assert!(quiet.quiet);
        assert!(!quiet.should_show_progress());

        let verbose = parse(&["init", "0,0", "-v"]).settings;
        assert!(verbose.verbose);
        assert!(verbose.should_show_progress());
    }

    // Tests the run seed varies with world size
    // Verified by returning the base seed unchanged
    #[test]
    fn test_run_seed() {
        assert_eq!(run_seed(42, 0), 42);
        assert_ne!(run_seed(42, 1), run_seed(42, 2));
        assert_ne!(run_seed(42, 1), 42);
    }

    // Tests init, generate and show against one store
    // Verified by skipping the commit in generate
    #[test]
    fn test_commands_end_to_end() {
        let dir = tempfile::tempdir().expect("tempdir");
        run(dir.path(), &["init", "0,0", "1,0"]).expect("init");
        run(dir.path(), &["generate", "0.5,0", "--context", "0"]).expect("generate");
        run(dir.path(), &["show"]).expect("show");

        assert!(run(dir.path(), &["init", "2,2"]).is_err());
        assert!(run(dir.path(), &["generate", "0,1", "--context", "7"]).is_err());

        let cli = parse(&["--store", &dir.path().display().to_string(), "-d", "3", "show"]);
        let config = cli.settings.sampler_config().expect("config");
        let store = WorldStateStore::open(&config).expect("store");
        assert_eq!(store.world().len(), 3);
    }
}

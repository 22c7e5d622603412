use super::*;

#[test]
fn parses_find_command() {
    let cli = Cli::try_parse_from([
        "igfind",
        "find",
        "Joe's Pizza",
        "123 Main St, Boston, MA",
        "--phone",
        "617-555-0100",
    ])
    .expect("expected valid cli args");

    let Commands::Find(args) = cli.command else {
        panic!("expected find command");
    };
    assert_eq!(args.name, "Joe's Pizza");
    assert_eq!(args.address, "123 Main St, Boston, MA");
    assert_eq!(args.phone.as_deref(), Some("617-555-0100"));
    assert!(!args.json);
}

#[test]
fn find_requires_an_address() {
    assert!(Cli::try_parse_from(["igfind", "find", "Joe's Pizza"]).is_err());
}

#[test]
fn bulk_defaults() {
    let cli = Cli::try_parse_from(["igfind", "bulk", "stores.csv"]).expect("expected valid cli args");

    let Commands::Bulk(args) = cli.command else {
        panic!("expected bulk command");
    };
    assert_eq!(args.input, PathBuf::from("stores.csv"));
    assert_eq!(args.output_dir, PathBuf::from("results"));
    assert!(args.workers.is_none());
    assert!(args.starts_per_sec.is_none());
    assert!(!args.shuffle);
    assert!(args.limit.is_none());
}

#[test]
fn bulk_with_overrides() {
    let cli = Cli::try_parse_from([
        "igfind",
        "bulk",
        "stores.csv",
        "--output-dir",
        "out",
        "--workers",
        "3",
        "--starts-per-sec",
        "0",
        "--shuffle",
        "--limit",
        "25",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Bulk(BulkArgs {
            workers: Some(3),
            shuffle: true,
            limit: Some(25),
            ..
        })
    ));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["igfind"]).is_err());
}

use super::*;
use clap::Parser;

#[test]
fn test_args_parsing() {
    let args = Args::parse_from(["uninstall", "Ace3"]);
    assert_eq!(args.name, "Ace3");
}

#[test]
fn test_args_parsing_git_url() {
    let args = Args::parse_from(["uninstall", "https://git.tukui.org/elvui/elvui.git"]);
    assert_eq!(args.name, "https://git.tukui.org/elvui/elvui.git");
}

#[test]
fn test_args_parsing_requires_name() {
    assert!(Args::try_parse_from(["uninstall"]).is_err());
}

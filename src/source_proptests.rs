use super::*;
use proptest::prelude::*;

/// リポジトリ名に使える文字列
fn valid_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,19}".prop_map(|s| s)
}

/// ホスト名
fn host_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,9}\\.(com|org|net)".prop_map(|s| s)
}

proptest! {
    /// 異なる形式で同じリポジトリを指定した場合、同じフォルダ名になる
    #[test]
    fn prop_all_formats_produce_same_git_name(
        host in host_strategy(),
        owner in valid_name_strategy(),
        repo in valid_name_strategy()
    ) {
        let https = format!("https://{}/{}/{}.git", host, owner, repo);
        let ssh = format!("ssh://git@{}/{}/{}", host, owner, repo);
        let scp = format!("git@{}:{}/{}.git", host, owner, repo);

        prop_assert_eq!(git_name(&https), Some(repo.clone()));
        prop_assert_eq!(git_name(&ssh), Some(repo.clone()));
        prop_assert_eq!(git_name(&scp), Some(repo));

        prop_assert_eq!(host_of(&https), Some(host.clone()));
        prop_assert_eq!(host_of(&ssh), Some(host.clone()));
        prop_assert_eq!(host_of(&scp), Some(host));
    }

    /// スラッグは常にカタログとして推定される
    #[test]
    fn prop_plain_names_are_catalog(name in valid_name_strategy()) {
        prop_assert_eq!(infer_platform(&name), Platform::Catalog);
        let source = Source::classify(Platform::Catalog, &name, &[]).unwrap();
        prop_assert_eq!(source.fallback_name(), name);
    }

    /// スクレイピング対象ホストの URL は常に GitScrape になる
    #[test]
    fn prop_scrape_hosts_always_scrape(
        host in host_strategy(),
        owner in valid_name_strategy(),
        repo in valid_name_strategy()
    ) {
        let url = format!("https://{}/{}/{}.git", host, owner, repo);
        let source = Source::classify(Platform::Git, &url, &[host.clone()]).unwrap();
        prop_assert!(matches!(source, Source::GitScrape { .. }), "expected GitScrape, got {:?}", source);

        let source = Source::classify(Platform::Git, &url, &[]).unwrap();
        prop_assert!(matches!(source, Source::GitClone { .. }), "expected GitClone, got {:?}", source);
    }
}

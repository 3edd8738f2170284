//! Download and signature tooling rules

use crate::repair::{insert_flag, upgrade_http_urls};
use crate::rule::Rule;
use dinghy_core::{NodeId, Query, Result, Tree, q};

pub const CURL_USE_FLAG_F: &str = "curlUseFlagF";
pub const CURL_USE_HTTPS_URL: &str = "curlUseHttpsUrl";
pub const WGET_USE_HTTPS_URL: &str = "wgetUseHttpsUrl";
pub const GPG_USE_BATCH_FLAG: &str = "gpgUseBatchFlag";

/// Command whose URL argument uses plain http
fn fetches_http(command: &str, url: &str) -> Query {
    q(command).child(q("BASH-COMMAND-ARGS").child(q(url).child(q("ABS-URL-HTTP"))))
}

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            CURL_USE_FLAG_F,
            "curl should use -f to fail on server errors",
            q("SC-CURL"),
        )
        .in_node(q("SC-CURL-F-FAIL"))
        .repair(curl_fail),
        Rule::new(
            CURL_USE_HTTPS_URL,
            "curl should download over https",
            fetches_http("SC-CURL", "SC-CURL-URL"),
        )
        .repair(use_https),
        Rule::new(
            WGET_USE_HTTPS_URL,
            "wget should download over https",
            fetches_http("SC-WGET", "SC-WGET-URL"),
        )
        .repair(use_https),
        Rule::new(
            GPG_USE_BATCH_FLAG,
            "gpg should run with --batch",
            q("SC-GPG"),
        )
        .in_node(q("SC-GPG-F-BATCH"))
        .repair(gpg_batch),
    ]
}

fn curl_fail(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, None, "-f").map(drop)
}

fn use_https(tree: &mut Tree, command: NodeId) -> Result<()> {
    upgrade_http_urls(tree, command).map(drop)
}

fn gpg_batch(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, None, "--batch").map(drop)
}

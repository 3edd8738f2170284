//! Package manager rules
//!
//! Non-interactive installs, no recommended extras, and no package caches
//! left behind in the image layer.

use crate::repair::{append_after, insert_flag, prepend_before};
use crate::rule::{Rule, Scope};
use dinghy_core::{NodeId, Query, Result, Tree, q};

pub const APT_GET_INSTALL_USE_Y: &str = "aptGetInstallUseY";
pub const APT_GET_INSTALL_USE_NO_REC: &str = "aptGetInstallUseNoRec";
pub const APT_GET_INSTALL_RM_APT_LISTS: &str = "aptGetInstallRmAptLists";
pub const APT_GET_UPDATE_PRECEDES_INSTALL: &str = "aptGetUpdatePrecedesInstall";
pub const YUM_INSTALL_FORCE_YES: &str = "yumInstallForceYes";
pub const YUM_INSTALL_RM_VAR_CACHE_YUM: &str = "yumInstallRmVarCacheYum";
pub const APK_ADD_USE_NO_CACHE: &str = "apkAddUseNoCache";
pub const PIP_USE_NO_CACHE_DIR: &str = "pipUseNoCacheDir";
pub const NPM_CACHE_CLEAN_AFTER_INSTALL: &str = "npmCacheCleanAfterInstall";
pub const NPM_CACHE_CLEAN_USE_FORCE: &str = "npmCacheCleanUseForce";
pub const GEM_UPDATE_SYSTEM_RM_ROOT_GEM: &str = "gemUpdateSystemRmRootGem";
pub const GEM_UPDATE_NO_DOCUMENT: &str = "gemUpdateNoDocument";

/// `rm` of a path carrying the given classification
fn removes(abstraction: &str) -> Query {
    q("SC-RM-PATH").child(q(abstraction))
}

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            APT_GET_INSTALL_USE_Y,
            "apt-get install should run non-interactively with -y",
            q("SC-APT-INSTALL"),
        )
        .in_node(q("SC-APT-F-YES"))
        .repair(apt_use_y),
        Rule::new(
            APT_GET_INSTALL_USE_NO_REC,
            "apt-get install should use --no-install-recommends",
            q("SC-APT-INSTALL"),
        )
        .in_node(q("SC-APT-F-NO-INSTALL-RECOMMENDS"))
        .repair(apt_no_recommends),
        Rule::new(
            APT_GET_INSTALL_RM_APT_LISTS,
            "apt-get install should be followed by removing /var/lib/apt/lists",
            q("SC-APT-INSTALL"),
        )
        .after(removes("ABS-APT-LISTS"))
        .repair(apt_rm_lists),
        Rule::new(
            APT_GET_UPDATE_PRECEDES_INSTALL,
            "apt-get update should run in the same RUN before apt-get install",
            q("SC-APT-INSTALL"),
        )
        .before(q("SC-APT-UPDATE"))
        .repair(apt_update_first),
        Rule::new(
            YUM_INSTALL_FORCE_YES,
            "yum install should run non-interactively with -y",
            q("SC-YUM-INSTALL"),
        )
        .in_node(q("SC-YUM-F-ASSUMEYES"))
        .repair(yum_use_y),
        Rule::new(
            YUM_INSTALL_RM_VAR_CACHE_YUM,
            "yum install should be followed by removing /var/cache/yum",
            q("SC-YUM-INSTALL"),
        )
        .after(removes("ABS-VAR-CACHE-YUM"))
        .repair(yum_rm_cache),
        Rule::new(
            APK_ADD_USE_NO_CACHE,
            "apk add should use --no-cache",
            q("SC-APK-ADD"),
        )
        .in_node(q("SC-APK-F-NO-CACHE"))
        .repair(apk_no_cache),
        Rule::new(
            PIP_USE_NO_CACHE_DIR,
            "pip install should use --no-cache-dir",
            q("SC-PIP-INSTALL"),
        )
        .in_node(q("SC-PIP-F-NO-CACHE-DIR"))
        .repair(pip_no_cache_dir),
        Rule::new(
            NPM_CACHE_CLEAN_AFTER_INSTALL,
            "npm install should be followed by npm cache clean",
            q("SC-NPM-INSTALL"),
        )
        .after(q("SC-NPM-CACHE-CLEAN"))
        .repair(npm_clean_cache),
        Rule::new(
            NPM_CACHE_CLEAN_USE_FORCE,
            "npm cache clean needs --force",
            q("SC-NPM-CACHE-CLEAN"),
        )
        .in_node(q("SC-NPM-F-FORCE"))
        .repair(npm_clean_force),
        Rule::new(
            GEM_UPDATE_SYSTEM_RM_ROOT_GEM,
            "gem update --system should be followed by removing /root/.gem",
            q("SC-GEM-UPDATE").child(q("BASH-COMMAND-ARGS").child(q("SC-GEM-F-SYSTEM"))),
        )
        .after(removes("ABS-ROOT-GEM"))
        .repair(gem_rm_root_gem),
        Rule::new(
            GEM_UPDATE_NO_DOCUMENT,
            "gem update should skip documentation, by flag or through .gemrc",
            q("SC-GEM-UPDATE"),
        )
        .scope(Scope::InterDirective)
        .in_node(q("SC-GEM-F-NO-DOCUMENT"))
        .before(q("ABS-GEMRC-NO-DOCUMENT"))
        .repair(gem_no_document),
    ]
}

fn apt_use_y(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, Some("install"), "-y").map(drop)
}

fn apt_no_recommends(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, Some("install"), "--no-install-recommends").map(drop)
}

fn apt_rm_lists(tree: &mut Tree, command: NodeId) -> Result<()> {
    append_after(tree, command, "rm -rf /var/lib/apt/lists/*").map(drop)
}

fn apt_update_first(tree: &mut Tree, command: NodeId) -> Result<()> {
    prepend_before(tree, command, "apt-get update").map(drop)
}

fn yum_use_y(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, Some("install"), "-y").map(drop)
}

fn yum_rm_cache(tree: &mut Tree, command: NodeId) -> Result<()> {
    append_after(tree, command, "rm -rf /var/cache/yum").map(drop)
}

fn apk_no_cache(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, Some("add"), "--no-cache").map(drop)
}

fn pip_no_cache_dir(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, Some("install"), "--no-cache-dir").map(drop)
}

fn npm_clean_cache(tree: &mut Tree, command: NodeId) -> Result<()> {
    append_after(tree, command, "npm cache clean --force").map(drop)
}

fn npm_clean_force(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, Some("clean"), "--force").map(drop)
}

fn gem_rm_root_gem(tree: &mut Tree, command: NodeId) -> Result<()> {
    append_after(tree, command, "rm -rf /root/.gem").map(drop)
}

fn gem_no_document(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, Some("update"), "--no-document").map(drop)
}

#[cfg(test)]
mod tests {
    use crate::engine::RuleSet;
    use dinghy_core::Dockerfile;

    fn fired(source: &str, rule: &str) -> usize {
        let mut doc = Dockerfile::parse(source);
        RuleSet::builtin()
            .analyze(&mut doc)
            .iter()
            .filter(|v| v.rule_id() == rule)
            .count()
    }

    #[test]
    fn test_apt_flags() {
        assert_eq!(fired("RUN apt-get install curl\n", super::APT_GET_INSTALL_USE_Y), 1);
        assert_eq!(fired("RUN apt-get install -qy curl\n", super::APT_GET_INSTALL_USE_Y), 0);
        assert_eq!(
            fired(
                "RUN apt-get install --no-install-recommends curl\n",
                super::APT_GET_INSTALL_USE_NO_REC
            ),
            0
        );
    }

    #[test]
    fn test_apt_lists_removed_later_in_script() {
        let source = "RUN apt-get update && apt-get install -y x && rm -rf /var/lib/apt/lists/*\n";
        assert_eq!(fired(source, super::APT_GET_INSTALL_RM_APT_LISTS), 0);
        assert_eq!(fired(source, super::APT_GET_UPDATE_PRECEDES_INSTALL), 0);
    }

    #[test]
    fn test_yum_and_apk() {
        assert_eq!(fired("RUN yum install x\n", super::YUM_INSTALL_FORCE_YES), 1);
        assert_eq!(
            fired("RUN yum install -y x && yum clean all && rm -rf /var/cache/yum\n", super::YUM_INSTALL_RM_VAR_CACHE_YUM),
            0
        );
        assert_eq!(fired("RUN apk add --no-cache git\n", super::APK_ADD_USE_NO_CACHE), 0);
        assert_eq!(fired("RUN apk add git\n", super::APK_ADD_USE_NO_CACHE), 1);
    }

    #[test]
    fn test_npm_cache_rules() {
        assert_eq!(fired("RUN npm install\n", super::NPM_CACHE_CLEAN_AFTER_INSTALL), 1);
        let cleaned = "RUN npm install && npm cache clean --force\n";
        assert_eq!(fired(cleaned, super::NPM_CACHE_CLEAN_AFTER_INSTALL), 0);
        assert_eq!(fired(cleaned, super::NPM_CACHE_CLEAN_USE_FORCE), 0);
        assert_eq!(fired("RUN npm cache clean\n", super::NPM_CACHE_CLEAN_USE_FORCE), 1);
    }

    #[test]
    fn test_gem_rules() {
        assert_eq!(fired("RUN gem update --system\n", super::GEM_UPDATE_SYSTEM_RM_ROOT_GEM), 1);
        assert_eq!(fired("RUN gem update bundler\n", super::GEM_UPDATE_SYSTEM_RM_ROOT_GEM), 0);
        assert_eq!(fired("RUN gem update --no-document x\n", super::GEM_UPDATE_NO_DOCUMENT), 0);
        assert_eq!(fired("RUN pip install flask\n", super::PIP_USE_NO_CACHE_DIR), 1);
    }
}

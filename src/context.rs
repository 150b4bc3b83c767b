//! The per-run state: registered tagfiles, namespace policy and result cache.
use std::path::{Path, PathBuf};

use tracing::{debug, error, trace, warn};

use crate::cache::{CacheStats, ResultCache};
use crate::config::Config;
use crate::escape;
use crate::namespace::NamespacePolicy;
use crate::resolver::Resolver;
use crate::tagfile::{TagTree, Tagfile, parse_tagfile};
use crate::types::{LinkRequest, TagfileDescriptor};

/// Base URL of the bundled cppreference index.
pub const CPPREFERENCE_BASE_URL: &str = "https://en.cppreference.com/w/";

/// Name reported for the bundled cppreference index.
pub const CPPREFERENCE_TAGFILE: &str = "cppreference-doxygen-web.tag.xml";

/// Bundled subset of the cppreference doxygen tagfile.
const CPPREFERENCE_XML: &str = include_str!("../data/cppreference-doxygen-web.tag.xml");

/// Everything needed to resolve symbols during one run.
///
/// Tagfiles are fixed once built; only the cache changes afterwards.
#[derive(Debug)]
pub struct Context {
    /// Results of earlier requests.
    cache: ResultCache,
    /// Using-namespace rules tried on a first-pass miss.
    namespaces: NamespacePolicy,
    /// Tagfiles in lookup order.
    tagfiles: Vec<Tagfile>,
}

impl Context {
    /// Cache counters for end-of-run reporting.
    pub fn cache_stats(&self) -> CacheStats {
        return self.cache.stats();
    }

    /// Load every configured tagfile, then the bundled cppreference index
    /// when enabled, and build the namespace policy.
    pub fn from_config(config: &Config) -> Self {
        let mut tagfiles: Vec<Tagfile> = config.tagfiles.iter().map(Tagfile::load).collect();
        if config.cppreference {
            tagfiles.push(bundled_cppreference());
        }
        return Self::new(tagfiles, NamespacePolicy::new(config.namespace_rules()));
    }

    /// Resolve a request to a link fragment, or `None` when unresolved.
    ///
    /// HTML entities in the symbol are decoded first. Results are cached per
    /// (symbol, component) unless the request carries its own link text.
    pub fn link(&mut self, request: &LinkRequest<'_>) -> Option<String> {
        let symbol = escape::decode(request.symbol);
        let resolver = Resolver::new(&self.tagfiles, &self.namespaces);

        if request.text.is_some() {
            return resolver.resolve(&symbol, request.text, request.component);
        }

        if let Some(cached) = self.cache.get(&symbol, request.component) {
            trace!(symbol = %symbol, component = ?request.component, "cache hit");
            return cached;
        }

        let link = resolver.resolve(&symbol, None, request.component);
        self.cache.set(&symbol, request.component, link.clone());
        return link;
    }

    /// Build a context from loaded tagfiles and a policy.
    ///
    /// A tagfile registered twice for the same component keeps its first position.
    pub fn new(tagfiles: Vec<Tagfile>, namespaces: NamespacePolicy) -> Self {
        let mut registered: Vec<Tagfile> = Vec::with_capacity(tagfiles.len());
        for tagfile in tagfiles {
            let duplicate = registered
                .iter()
                .any(|seen| return seen.file == tagfile.file && seen.component == tagfile.component);
            if duplicate {
                warn!(file = %tagfile.file.display(), component = ?tagfile.component, "duplicate tagfile ignored");
                continue;
            }
            registered.push(tagfile);
        }
        return Self { cache: ResultCache::default(), namespaces, tagfiles: registered };
    }

    /// Registered tagfiles in lookup order.
    pub fn tagfiles(&self) -> &[Tagfile] {
        return &self.tagfiles;
    }
}

/// The bundled cppreference index: global, external.
fn bundled_cppreference() -> Tagfile {
    let descriptor = TagfileDescriptor {
        base_url: CPPREFERENCE_BASE_URL.to_string(),
        component: None,
        external: true,
        file: PathBuf::from(CPPREFERENCE_TAGFILE),
    };
    let tree = match parse_tagfile(Path::new(CPPREFERENCE_TAGFILE), CPPREFERENCE_XML) {
        Err(e) => {
            error!("{e}");
            TagTree::default()
        },
        Ok(tree) => tree,
    };
    debug!(compounds = tree.compound_count(), "registered bundled cppreference tagfile");
    return Tagfile::from_tree(&descriptor, tree);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;

    fn default_context() -> Context {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        Context::from_config(&config)
    }

    fn request<'a>(symbol: &'a str, text: Option<&'a str>, component: Option<&'a str>) -> LinkRequest<'a> {
        LinkRequest { component, symbol, text }
    }

    #[test]
    fn bundled_index_links_include_files() {
        let mut ctx = default_context();
        assert_eq!(
            ctx.link(&request("<algorithm>", None, None)).as_deref(),
            Some("https://en.cppreference.com/w/cpp/header/algorithm[&lt;algorithm&gt;,window=\"_blank\"]")
        );
    }

    #[test]
    fn encoded_symbols_are_decoded_before_lookup() {
        let mut ctx = default_context();
        assert_eq!(
            ctx.link(&request("&lt;algorithm&gt;", None, None)).as_deref(),
            Some("https://en.cppreference.com/w/cpp/header/algorithm[&lt;algorithm&gt;,window=\"_blank\"]")
        );
    }

    #[test]
    fn bundled_index_resolves_std_members() {
        let mut ctx = default_context();
        assert_eq!(
            ctx.link(&request("std::allocator::address", None, None)).as_deref(),
            Some("https://en.cppreference.com/w/cpp/memory/allocator/address[std::allocator::address,window=\"_blank\"]")
        );
        assert_eq!(
            ctx.link(&request("string_view", None, None)).as_deref(),
            Some("https://en.cppreference.com/w/cpp/string/basic_string_view[string_view,window=\"_blank\"]")
        );
    }

    #[test]
    fn repeated_requests_are_served_from_cache() {
        let mut ctx = default_context();
        let first = ctx.link(&request("std::vector<int>", None, None));
        let second = ctx.link(&request("std::vector<int>", None, None));
        assert_eq!(first, second);
        assert_eq!(ctx.cache_stats(), CacheStats { entries: 1, hits: 1, misses: 1 });

        assert_eq!(ctx.link(&request("no_such_symbol", None, None)), None);
        assert_eq!(ctx.link(&request("no_such_symbol", None, None)), None);
        assert_eq!(ctx.cache_stats(), CacheStats { entries: 2, hits: 2, misses: 2 });
    }

    #[test]
    fn overrides_bypass_the_cache() {
        let mut ctx = default_context();
        assert_eq!(
            ctx.link(&request("std::vector", Some("vector"), None)).as_deref(),
            Some("https://en.cppreference.com/w/cpp/container/vector[vector,window=\"_blank\"]")
        );
        assert_eq!(ctx.cache_stats(), CacheStats { entries: 0, hits: 0, misses: 0 });
    }

    #[test]
    fn cache_is_keyed_by_component() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("url.tag.xml"),
            r#"<tagfile><compound kind="class"><name>boost::urls::url</name><filename>url.html</filename></compound></tagfile>"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("http.tag.xml"),
            r#"<tagfile><compound kind="class"><name>boost::urls::url</name><filename>other.html</filename></compound></tagfile>"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
            cppreference = false
            [[tagfiles]]
            file = "url.tag.xml"
            base-url = "/url/"
            component = "url"
            [[tagfiles]]
            file = "http.tag.xml"
            base-url = "/http/"
            component = "http"
            [[using-namespaces]]
            namespace = "boost::urls"
            component = "url"
            [[using-namespaces]]
            namespace = "boost::urls"
            component = "http"
            "#,
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        let mut ctx = Context::from_config(&config);

        assert_eq!(ctx.link(&request("url", None, Some("url"))).as_deref(), Some("/url/url.html[url]"));
        assert_eq!(ctx.link(&request("url", None, Some("http"))).as_deref(), Some("/http/other.html[url]"));
        assert_eq!(ctx.link(&request("url", None, Some("json"))), None);
        assert_eq!(ctx.link(&request("url", None, None)), None);
        assert_eq!(ctx.cache_stats().entries, 4);
        assert_eq!(ctx.cache_stats().hits, 0);

        assert_eq!(ctx.link(&request("url", None, Some("http"))).as_deref(), Some("/http/other.html[url]"));
        assert_eq!(ctx.link(&request("url", None, Some("url"))).as_deref(), Some("/url/url.html[url]"));
        assert_eq!(ctx.cache_stats().entries, 4);
        assert_eq!(ctx.cache_stats().hits, 2);
    }

    #[test]
    fn stray_ampersand_keeps_entity_decoding() {
        let mut ctx = Context::new(Vec::new(), NamespacePolicy::new(Vec::new()));
        assert_eq!(ctx.link(&request("Foo&lt;Bar&gt;&", None, None)).as_deref(), Some("Foo&lt;Bar&gt;&amp;"));
    }

    #[test]
    fn missing_tagfile_stays_registered_without_matches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[[tagfiles]]\nfile = \"missing.tag.xml\"\nbase-url = \"/missing/\"\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        let mut ctx = Context::from_config(&config);

        assert_eq!(ctx.tagfiles().len(), 2);
        assert_eq!(ctx.tagfiles()[0].tree.compound_count(), 0);
        assert!(ctx.link(&request("std::vector", None, None)).is_some());
    }

    #[test]
    fn duplicate_tagfiles_keep_first_position() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
            cppreference = false
            [[tagfiles]]
            file = "a.tag.xml"
            base-url = "/first/"
            [[tagfiles]]
            file = "b.tag.xml"
            base-url = "/b/"
            [[tagfiles]]
            file = "a.tag.xml"
            base-url = "/again/"
            [[tagfiles]]
            file = "a.tag.xml"
            base-url = "/scoped/"
            component = "url"
            "#,
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        let ctx = Context::from_config(&config);

        let bases: Vec<&str> = ctx.tagfiles().iter().map(|t| t.base_url.as_str()).collect();
        assert_eq!(bases, vec!["/first/", "/b/", "/scoped/"]);
    }

    #[test]
    fn bundled_index_is_registered_last() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("project.tag.xml"),
            r#"<tagfile><compound kind="class"><name>std::vector</name><filename>vec.html</filename></compound></tagfile>"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[[tagfiles]]\nfile = \"project.tag.xml\"\nbase-url = \"/project/\"\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        let mut ctx = Context::from_config(&config);

        assert_eq!(ctx.tagfiles().last().map(|t| t.base_url.as_str()), Some(CPPREFERENCE_BASE_URL));
        assert_eq!(ctx.link(&request("std::vector", None, None)).as_deref(), Some("/project/vec.html[std::vector]"));
    }
}

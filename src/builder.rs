//! The build session: page registration, route bookkeeping, and the build
//! replay.
//!
//! A [`Builder`] owns everything the build needs — the page table, the
//! global route-uniqueness map, the template registry, and the static asset
//! set. Registering a page compiles its route, expands its value sources
//! into concrete route variables, and claims every resulting route, all
//! before returning; a failure leaves the session untouched. Building
//! replays the stored route variables twice, once to create directories and
//! once to render, in the exact order expansion produced them.
//!
//! Views receive a [`PageContext`] carrying the route being rendered, which
//! is what `url_for` resolves relative paths against. The context is
//! threaded through the call rather than stored on the session, so nothing
//! about rendering relies on shared mutable state.
//!
//! ```no_run
//! use flatsite::builder::{BuildOptions, Builder};
//! use flatsite::values::{ValueList, ValueSource, ValueSources};
//!
//! let mut site = Builder::new();
//! site.register(
//!     "cruise_report",
//!     "/<string:ship>/cruise/<int:cruise_id>/",
//!     ValueSources::new()
//!         .with("ship", ValueList::strings(["Oleander", "Bonnevie"]))
//!         .with(
//!             "cruise_id",
//!             ValueSource::keyed([
//!                 ("Oleander", ValueList::ints([1, 2])),
//!                 ("Bonnevie", ValueList::ints([99])),
//!             ]),
//!         ),
//!     |_ctx, vars| Ok(format!("<h2>{} cruise {}</h2>", vars[0], vars[1])),
//! )?;
//! site.build(&BuildOptions::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::SiteConfig;
use crate::expand::{self, ExpandError, RouteVariable};
use crate::fsio::{self, Mode, SafetyError};
use crate::route::{RouteError, RoutePattern};
use crate::statics::{AssetError, AssetSet, CollectOptions, StaticAsset, StaticKind};
use crate::templates::{Context, RenderError, TemplateRegistry};
use crate::values::{Value, ValueSources};

/// Reserved for the asset namespace in link resolution.
const RESERVED_PAGE_NAME: &str = "static";

/// Embedded fallback stylesheet, written when no custom one is configured.
const DEFAULT_STYLESHEET: &str = include_str!("../static/stylesheet.css");

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Safety(#[from] SafetyError),
    #[error("view cannot be named 'static'; that name is reserved for the asset namespace")]
    ReservedName,
    #[error("'{0}' is already used for another view")]
    DuplicatePage(String),
    #[error(
        "change route pattern and/or variables of '{page}': \
         '{route}' is already used by another view ('{owner}')"
    )]
    DuplicateRoute {
        route: String,
        page: String,
        owner: String,
    },
}

#[derive(Error, Debug)]
pub enum UrlError {
    #[error("no view named '{0}' to build a url for")]
    UnknownPage(String),
    #[error("url_for('{page}') takes {expected} argument(s), got {given}")]
    ArityMismatch {
        page: String,
        expected: usize,
        given: usize,
    },
    #[error("url_for('{page}'): argument '{name}' must be '{expected}', got '{given}'")]
    TypeMismatch {
        page: String,
        name: String,
        expected: String,
        given: String,
    },
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Url(#[from] UrlError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("unknown view '{0}' in the build selection")]
    UnknownView(String),
    #[error("view failed: {0}")]
    View(String),
}

/// Handle returned by a successful registration.
#[derive(Debug, Clone)]
pub struct PageHandle {
    name: String,
    route_count: usize,
}

impl PageHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of concrete routes the page expanded to. Zero-placeholder
    /// pages count one.
    pub fn route_count(&self) -> usize {
        self.route_count
    }
}

/// The view callable plus everything computed at its registration.
struct Page {
    name: String,
    pattern: RoutePattern,
    route_vars: Vec<RouteVariable>,
    view: View,
}

/// A view: the page context plus one route variable's scalars, in
/// placeholder order, to rendered text. The slice always holds exactly one
/// value per placeholder.
pub type View = Box<dyn Fn(&PageContext<'_>, &[Value]) -> Result<String, BuildError>>;

/// Options for one build pass.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Destination root; created if absent.
    pub dest: PathBuf,
    /// Page names to build; empty builds everything, in registration order.
    pub views: Vec<String>,
    /// Replace pre-existing rendered files and static assets.
    pub overwrite: bool,
    pub dir_mode: Mode,
    pub html_mode: Mode,
    pub static_mode: Mode,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            dest: PathBuf::from("build"),
            views: Vec::new(),
            overwrite: true,
            dir_mode: Mode::DIR,
            html_mode: Mode::FILE,
            static_mode: Mode::FILE,
        }
    }
}

impl BuildOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            dest: config.dest.clone(),
            views: Vec::new(),
            overwrite: config.build.overwrite,
            dir_mode: config.build.dir_mode,
            html_mode: config.build.html_mode,
            static_mode: config.build.static_mode,
        }
    }
}

/// What one build pass wrote, page by page, in build order.
#[derive(Debug, Default, Serialize)]
pub struct BuildReport {
    pub dest: PathBuf,
    pub pages: Vec<PageReport>,
}

#[derive(Debug, Serialize)]
pub struct PageReport {
    pub name: String,
    /// Routes rendered and written, in render order.
    pub written: Vec<String>,
    /// Routes left untouched by the overwrite policy.
    pub skipped: Vec<String>,
}

impl BuildReport {
    pub fn total_written(&self) -> usize {
        self.pages.iter().map(|p| p.written.len()).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.pages.iter().map(|p| p.skipped.len()).sum()
    }
}

/// One static site build session.
pub struct Builder {
    meta: BTreeMap<String, String>,
    stylesheet: Option<PathBuf>,
    favicon: Option<PathBuf>,
    assets_dir: Option<PathBuf>,
    check_urls: bool,
    check_paths: bool,
    templates: TemplateRegistry,
    assets: AssetSet,
    pages: Vec<Page>,
    page_index: BTreeMap<String, usize>,
    /// Full route (directory + filename) to owning page name, across every
    /// page of the session.
    routes: BTreeMap<String, String>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            meta: BTreeMap::new(),
            stylesheet: None,
            favicon: None,
            assets_dir: None,
            check_urls: true,
            check_paths: false,
            templates: TemplateRegistry::new(),
            assets: AssetSet::new(),
            pages: Vec::new(),
            page_index: BTreeMap::new(),
            routes: BTreeMap::new(),
        }
    }

    /// A session configured from `site.toml`.
    pub fn from_config(config: &SiteConfig) -> Self {
        let mut builder = Self::new();
        if let Some(title) = &config.site.title {
            builder.meta.insert("title".into(), title.clone());
        }
        if let Some(description) = &config.site.description {
            builder.meta.insert("description".into(), description.clone());
        }
        if let Some(author) = &config.site.author {
            builder.meta.insert("author".into(), author.clone());
        }
        builder.stylesheet = config.stylesheet.clone();
        builder.favicon = config.favicon.clone();
        builder.assets_dir = config.assets.clone();
        builder.check_urls = config.safety.check_urls;
        builder.check_paths = config.safety.check_paths;
        builder
    }

    // ------------------------------------------------------------------
    // Session surface: metadata, templates, assets
    // ------------------------------------------------------------------

    /// Site metadata exposed to templates through [`PageContext::meta`].
    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    pub fn set_meta(&mut self, key: &str, value: &str) {
        self.meta.insert(key.to_string(), value.to_string());
    }

    pub fn set_stylesheet(&mut self, path: impl Into<PathBuf>) {
        self.stylesheet = Some(path.into());
    }

    pub fn set_favicon(&mut self, path: impl Into<PathBuf>) {
        self.favicon = Some(path.into());
    }

    /// Directory copied recursively into `static/` during the build.
    pub fn set_assets_dir(&mut self, path: impl Into<PathBuf>) {
        self.assets_dir = Some(path.into());
    }

    /// Register a named template on the session.
    pub fn add_template<F>(&mut self, name: &str, template: F)
    where
        F: Fn(&Context) -> String + 'static,
    {
        self.templates.insert(name, template);
    }

    /// Render a registered template. Views normally go through
    /// [`PageContext::render`] instead.
    pub fn render(&self, name: &str, context: &Context) -> Result<String, RenderError> {
        self.templates.render(name, context)
    }

    /// Register a plain static file, deployed under `files/`.
    pub fn add_static_file(
        &mut self,
        name: &str,
        source: &Path,
        dest: Option<&str>,
        handle_duplicate: bool,
    ) -> Result<StaticAsset, AssetError> {
        self.assets
            .add(StaticKind::File, name, source, dest, handle_duplicate)
    }

    /// Register an image, deployed under `images/`.
    pub fn add_image(
        &mut self,
        name: &str,
        source: &Path,
        dest: Option<&str>,
        handle_duplicate: bool,
    ) -> Result<StaticAsset, AssetError> {
        self.assets
            .add(StaticKind::Image, name, source, dest, handle_duplicate)
    }

    /// Register a downloadable file, deployed under `downloads/`.
    pub fn add_download(
        &mut self,
        name: &str,
        source: &Path,
        dest: Option<&str>,
        handle_duplicate: bool,
    ) -> Result<StaticAsset, AssetError> {
        self.assets
            .add(StaticKind::Download, name, source, dest, handle_duplicate)
    }

    /// Deploy the registered static assets under `site_root` (normally the
    /// build destination, after [`Builder::build`]).
    pub fn collect_assets(
        &self,
        site_root: &Path,
        opts: &CollectOptions,
    ) -> Result<(), AssetError> {
        self.assets.collect(site_root, opts)
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a view under `name` against `route`, expanding `sources`
    /// into this page's concrete routes.
    ///
    /// Everything is validated here — route grammar, source arity and
    /// naming, value types, chained-key coverage, global route uniqueness,
    /// character safety — and a failure leaves the session unchanged. After
    /// a successful return the page and its routes are immutable.
    pub fn register<F>(
        &mut self,
        name: &str,
        route: &str,
        sources: ValueSources,
        view: F,
    ) -> Result<PageHandle, RegisterError>
    where
        F: Fn(&PageContext<'_>, &[Value]) -> Result<String, BuildError> + 'static,
    {
        if name == RESERVED_PAGE_NAME {
            return Err(RegisterError::ReservedName);
        }
        if self.page_index.contains_key(name) {
            return Err(RegisterError::DuplicatePage(name.to_string()));
        }

        let pattern = RoutePattern::compile(route)?;
        let route_vars = expand::expand(route, pattern.placeholders(), &sources)?;

        // Claim every concrete route, but only after the whole set checks
        // out; a failure part-way must not leave earlier claims behind.
        let mut claimed = Vec::new();
        for dir in route_dirs(&pattern, &route_vars) {
            if self.check_urls {
                fsio::check_url_unsafe(&dir)?;
            }
            if self.check_paths {
                fsio::check_path_illegal(&dir)?;
            }
            let full = join_route(&dir, pattern.output_filename());
            if let Some(owner) = self.routes.get(&full) {
                return Err(RegisterError::DuplicateRoute {
                    route: full,
                    page: name.to_string(),
                    owner: owner.clone(),
                });
            }
            if claimed.contains(&full) {
                return Err(RegisterError::DuplicateRoute {
                    route: full,
                    page: name.to_string(),
                    owner: name.to_string(),
                });
            }
            claimed.push(full);
        }

        let route_count = claimed.len();
        for full in claimed {
            self.routes.insert(full, name.to_string());
        }
        self.page_index.insert(name.to_string(), self.pages.len());
        self.pages.push(Page {
            name: name.to_string(),
            pattern,
            route_vars,
            view: Box::new(view),
        });

        Ok(PageHandle {
            name: name.to_string(),
            route_count,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total concrete routes claimed across all pages.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    // ------------------------------------------------------------------
    // Build replay
    // ------------------------------------------------------------------

    /// Run one build pass: create every route directory, deploy the static
    /// subtree, then render every page in order and write its output.
    pub fn build(&self, opts: &BuildOptions) -> Result<BuildReport, BuildError> {
        let dest = &opts.dest;
        fsio::ensure_dir(dest, opts.dir_mode)?;

        let selected = self.select_pages(&opts.views)?;

        // Directory pass, in expansion order.
        for page in &selected {
            for dir in route_dirs(&page.pattern, &page.route_vars) {
                if !dir.is_empty() {
                    fsio::ensure_dir(&dest.join(&dir), opts.dir_mode)?;
                }
            }
        }

        self.deploy_static(dest, opts)?;

        // Render pass, same order as the directory pass.
        let mut report = BuildReport {
            dest: dest.clone(),
            pages: Vec::new(),
        };
        for page in &selected {
            let mut written = Vec::new();
            let mut skipped = Vec::new();
            let filename = page.pattern.output_filename();
            let empty: &[Value] = &[];
            let tuples: Vec<(&[Value], String)> = if page.route_vars.is_empty() {
                vec![(empty, concrete_dir(&page.pattern, &[]))]
            } else {
                page.route_vars
                    .iter()
                    .map(|vars| {
                        (
                            vars.as_slice(),
                            concrete_dir(&page.pattern, vars.as_slice()),
                        )
                    })
                    .collect()
            };
            for (vars, dir) in tuples {
                let ctx = PageContext {
                    builder: self,
                    current_route: &dir,
                };
                let rendered = (page.view)(&ctx, vars)?;
                let route = join_route(&dir, filename);
                let path = dest.join(&route);
                if path.exists() && !opts.overwrite {
                    skipped.push(route);
                    continue;
                }
                fsio::write_text(&path, &rendered)?;
                fsio::set_mode(&path, opts.html_mode)?;
                written.push(route);
            }
            report.pages.push(PageReport {
                name: page.name.clone(),
                written,
                skipped,
            });
        }
        Ok(report)
    }

    fn select_pages(&self, views: &[String]) -> Result<Vec<&Page>, BuildError> {
        if views.is_empty() {
            return Ok(self.pages.iter().collect());
        }
        views
            .iter()
            .map(|name| {
                self.page_index
                    .get(name)
                    .map(|idx| &self.pages[*idx])
                    .ok_or_else(|| BuildError::UnknownView(name.clone()))
            })
            .collect()
    }

    /// Create `static/` and fill it: the user asset bundle, the
    /// stylesheet (custom or embedded default), and the favicon.
    fn deploy_static(&self, dest: &Path, opts: &BuildOptions) -> Result<(), BuildError> {
        let static_dir = dest.join("static");
        fsio::ensure_dir(&static_dir, opts.dir_mode)?;

        if let Some(assets_dir) = &self.assets_dir {
            if !assets_dir.is_dir() {
                return Err(BuildError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("assets directory does not exist: {}", assets_dir.display()),
                )));
            }
            fsio::copy_tree(assets_dir, &static_dir, opts.overwrite)?;
        }

        let css_dst = static_dir.join("stylesheet.css");
        if opts.overwrite || !css_dst.exists() {
            match &self.stylesheet {
                Some(src) => {
                    if !src.is_file() {
                        return Err(BuildError::Io(io::Error::new(
                            io::ErrorKind::NotFound,
                            format!("stylesheet does not exist: {}", src.display()),
                        )));
                    }
                    fsio::copy_file(src, &css_dst)?;
                }
                None => fsio::write_text(&css_dst, DEFAULT_STYLESHEET)?,
            }
        }

        if let Some(favicon) = &self.favicon {
            if !favicon.is_file() {
                return Err(BuildError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("favicon does not exist: {}", favicon.display()),
                )));
            }
            let icon_dst = static_dir.join("favicon.ico");
            if opts.overwrite || !icon_dst.exists() {
                fsio::copy_file(favicon, &icon_dst)?;
            }
        }

        fsio::apply_modes(&static_dir, opts.dir_mode, opts.static_mode)?;
        Ok(())
    }
}

/// The route being rendered, threaded into every view invocation. All link
/// resolution is relative to it.
pub struct PageContext<'a> {
    builder: &'a Builder,
    current_route: &'a str,
}

impl PageContext<'_> {
    /// Concrete directory of the page being rendered, relative to the site
    /// root; empty for the root itself.
    pub fn current_route(&self) -> &str {
        self.current_route
    }

    /// Site metadata from the session.
    pub fn meta(&self) -> &BTreeMap<String, String> {
        self.builder.meta()
    }

    /// Render a registered template.
    pub fn render(&self, template: &str, context: &Context) -> Result<String, RenderError> {
        self.builder.templates.render(template, context)
    }

    /// Relative path from the page being rendered to `page`'s output for
    /// the given placeholder arguments.
    ///
    /// The argument count and each argument's type must match the target
    /// page's declared placeholders, in order.
    pub fn url_for(&self, page: &str, args: &[Value]) -> Result<String, UrlError> {
        let target = self
            .builder
            .page_index
            .get(page)
            .map(|idx| &self.builder.pages[*idx])
            .ok_or_else(|| UrlError::UnknownPage(page.to_string()))?;
        let placeholders = target.pattern.placeholders();
        if placeholders.len() != args.len() {
            return Err(UrlError::ArityMismatch {
                page: page.to_string(),
                expected: placeholders.len(),
                given: args.len(),
            });
        }
        for (placeholder, arg) in placeholders.iter().zip(args) {
            if placeholder.ty != arg.kind() {
                return Err(UrlError::TypeMismatch {
                    page: page.to_string(),
                    name: placeholder.name.clone(),
                    expected: placeholder.ty.to_string(),
                    given: arg.kind().to_string(),
                });
            }
        }
        let dir = concrete_dir(&target.pattern, args);
        let path = join_route(&dir, target.pattern.output_filename());
        Ok(fsio::relative_to(&path, self.current_route))
    }

    /// Relative path to a file in the `static/` namespace.
    pub fn static_url(&self, filename: &str) -> String {
        let target = format!("static/{}", filename.trim_start_matches('/'));
        fsio::relative_to(&target, self.current_route)
    }

    /// Relative path to a collected static asset.
    pub fn asset_url(&self, asset: &StaticAsset) -> String {
        fsio::relative_to(&asset.site_path(), self.current_route)
    }
}

/// Substitute a value tuple and normalize to a root-relative directory
/// string without surrounding separators; empty means the site root.
fn concrete_dir(pattern: &RoutePattern, values: &[Value]) -> String {
    pattern
        .dir_pattern()
        .render(values)
        .trim_matches('/')
        .to_string()
}

/// Concrete directories for a page, in expansion order. Zero-placeholder
/// pages map to their single literal directory.
fn route_dirs(pattern: &RoutePattern, route_vars: &[RouteVariable]) -> Vec<String> {
    if route_vars.is_empty() {
        vec![concrete_dir(pattern, &[])]
    } else {
        route_vars
            .iter()
            .map(|vars| concrete_dir(pattern, vars.as_slice()))
            .collect()
    }
}

fn join_route(dir: &str, filename: &str) -> String {
    if dir.is_empty() {
        filename.to_string()
    } else {
        format!("{dir}/{filename}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{ValueList, ValueSource};

    fn static_view(body: &'static str) -> impl Fn(&PageContext<'_>, &[Value]) -> Result<String, BuildError> {
        move |_ctx, _vars| Ok(body.to_string())
    }

    fn ship_site() -> Builder {
        let mut site = Builder::new();
        site.register("home", "/hello_world.html", ValueSources::new(), |_ctx, _vars| {
            Ok("<h2>Hello World !</h2>".to_string())
        })
        .unwrap();
        site.register(
            "cruise_report",
            "/<string:ship>/cruise/<int:cruise_id>/",
            ValueSources::new()
                .with("ship", ValueList::strings(["Shippy", "Boatty"]))
                .with(
                    "cruise_id",
                    ValueSource::keyed([
                        ("Shippy", ValueList::ints([1, 2])),
                        ("Boatty", ValueList::ints([99, 98, 97])),
                    ]),
                ),
            |_ctx, vars| Ok(format!("cruise {} of {}", vars[1], vars[0])),
        )
        .unwrap();
        site
    }

    #[test]
    fn registration_reports_route_counts() {
        let mut site = ship_site();
        assert_eq!(site.page_count(), 2);
        // 1 static route + 2 + 3 keyed routes
        assert_eq!(site.route_count(), 6);

        let handle = site
            .register(
                "folders",
                "/f/<int:n>/",
                ValueSources::new().with("n", ValueList::ints([1, 2])),
                static_view("x"),
            )
            .unwrap();
        assert_eq!(handle.name(), "folders");
        assert_eq!(handle.route_count(), 2);
    }

    #[test]
    fn session_templates_render_outside_views() {
        let mut site = Builder::new();
        site.add_template("t", |_: &Context| "ok".to_string());
        assert_eq!(site.render("t", &Context::new()).unwrap(), "ok");
    }

    #[test]
    fn page_names_must_be_unique() {
        let mut site = ship_site();
        let err = site
            .register("home", "/again.html", ValueSources::new(), static_view("x"))
            .unwrap_err();
        assert!(matches!(err, RegisterError::DuplicatePage(name) if name == "home"));
    }

    #[test]
    fn the_static_name_is_reserved() {
        let mut site = Builder::new();
        let err = site
            .register("static", "/s.html", ValueSources::new(), static_view("x"))
            .unwrap_err();
        assert!(matches!(err, RegisterError::ReservedName));
    }

    #[test]
    fn colliding_routes_identify_the_owner() {
        let mut site = ship_site();
        let err = site
            .register(
                "imposter",
                "/<string:ship>/cruise/<int:cruise_id>/",
                ValueSources::new()
                    .with("ship", ValueList::strings(["Shippy"]))
                    .with("cruise_id", ValueList::ints([1])),
                static_view("x"),
            )
            .unwrap_err();
        match err {
            RegisterError::DuplicateRoute { route, page, owner } => {
                assert_eq!(route, "Shippy/cruise/1/index.html");
                assert_eq!(page, "imposter");
                assert_eq!(owner, "cruise_report");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_routes_within_one_page_collide_too() {
        let mut site = Builder::new();
        let err = site
            .register(
                "dupes",
                "/<string:x>/",
                ValueSources::new().with("x", ValueList::strings(["a", " a "])),
                static_view("x"),
            )
            .unwrap_err();
        match err {
            RegisterError::DuplicateRoute { page, owner, .. } => {
                assert_eq!(page, "dupes");
                assert_eq!(owner, "dupes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_registration_leaves_the_session_unchanged() {
        let mut site = ship_site();
        let before = site.route_count();
        // Second value collides with cruise_report's route; the first must
        // not stay claimed.
        let err = site.register(
            "partial",
            "/<string:ship>/cruise/<int:cruise_id>/",
            ValueSources::new()
                .with("ship", ValueList::strings(["Freshy", "Shippy"]))
                .with(
                    "cruise_id",
                    ValueSource::keyed([
                        ("Freshy", ValueList::ints([5])),
                        ("Shippy", ValueList::ints([1])),
                    ]),
                ),
            static_view("x"),
        );
        assert!(err.is_err());
        assert_eq!(site.route_count(), before);
        assert_eq!(site.page_count(), 2);
        // The non-colliding route is free for a later registration.
        site.register(
            "fresh",
            "/Freshy/cruise/5/",
            ValueSources::new(),
            static_view("x"),
        )
        .unwrap();
    }

    #[test]
    fn unsafe_url_characters_fail_registration_by_default() {
        let mut site = Builder::new();
        let err = site
            .register(
                "spaced",
                "/<string:name>/",
                ValueSources::new().with("name", ValueList::strings(["has space"])),
                static_view("x"),
            )
            .unwrap_err();
        assert!(matches!(err, RegisterError::Safety(SafetyError::UnsafeUrl { .. })));
    }

    #[test]
    fn url_checks_can_be_disabled() {
        let mut config = SiteConfig::default();
        config.safety.check_urls = false;
        let mut site = Builder::from_config(&config);
        site.register(
            "spaced",
            "/<string:name>/",
            ValueSources::new().with("name", ValueList::strings(["has space"])),
            static_view("x"),
        )
        .unwrap();
    }

    #[test]
    fn path_checks_reject_dots_when_enabled() {
        let mut config = SiteConfig::default();
        config.safety.check_paths = true;
        let mut site = Builder::from_config(&config);
        let err = site
            .register(
                "floaty",
                "/<float:x>/",
                ValueSources::new().with("x", ValueList::floats([1.5])),
                static_view("x"),
            )
            .unwrap_err();
        assert!(matches!(err, RegisterError::Safety(SafetyError::IllegalPath { .. })));
    }

    #[test]
    fn url_for_is_relative_to_the_current_route() {
        let site = ship_site();
        let ctx = PageContext {
            builder: &site,
            current_route: "Shippy/cruise/1",
        };
        assert_eq!(
            ctx.url_for("home", &[]).unwrap(),
            "../../../hello_world.html"
        );
        assert_eq!(
            ctx.url_for("cruise_report", &[Value::from("Boatty"), Value::from(99)])
                .unwrap(),
            "../../../Boatty/cruise/99/index.html"
        );
        assert_eq!(ctx.static_url("stylesheet.css"), "../../../static/stylesheet.css");

        let root = PageContext {
            builder: &site,
            current_route: "",
        };
        assert_eq!(
            root.url_for("cruise_report", &[Value::from("Shippy"), Value::from(2)])
                .unwrap(),
            "Shippy/cruise/2/index.html"
        );
    }

    #[test]
    fn url_for_validates_target_and_arguments() {
        let site = ship_site();
        let ctx = PageContext {
            builder: &site,
            current_route: "",
        };
        assert!(matches!(
            ctx.url_for("nope", &[]),
            Err(UrlError::UnknownPage(_))
        ));
        assert!(matches!(
            ctx.url_for("cruise_report", &[Value::from("Shippy")]),
            Err(UrlError::ArityMismatch {
                expected: 2,
                given: 1,
                ..
            })
        ));
        assert!(matches!(
            ctx.url_for("cruise_report", &[Value::from(1), Value::from("Shippy")]),
            Err(UrlError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn build_writes_every_route_in_order() {
        let site = ship_site();
        let tmp = tempfile::tempdir().unwrap();
        let opts = BuildOptions {
            dest: tmp.path().join("out"),
            ..BuildOptions::default()
        };
        let report = site.build(&opts).unwrap();

        assert_eq!(report.total_written(), 6);
        assert_eq!(report.total_skipped(), 0);
        assert_eq!(report.pages[1].name, "cruise_report");
        assert_eq!(
            report.pages[1].written,
            vec![
                "Shippy/cruise/1/index.html",
                "Shippy/cruise/2/index.html",
                "Boatty/cruise/99/index.html",
                "Boatty/cruise/98/index.html",
                "Boatty/cruise/97/index.html",
            ]
        );

        let out = tmp.path().join("out");
        assert_eq!(
            std::fs::read_to_string(out.join("hello_world.html")).unwrap(),
            "<h2>Hello World !</h2>"
        );
        assert_eq!(
            std::fs::read_to_string(out.join("Boatty/cruise/97/index.html")).unwrap(),
            "cruise 97 of Boatty"
        );
        assert!(out.join("static/stylesheet.css").is_file());
    }

    #[test]
    fn overwrite_off_keeps_the_first_write() {
        let site = ship_site();
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out");
        let opts = BuildOptions {
            dest: dest.clone(),
            ..BuildOptions::default()
        };
        site.build(&opts).unwrap();
        std::fs::write(dest.join("hello_world.html"), "edited by hand").unwrap();

        let keep = BuildOptions {
            dest: dest.clone(),
            overwrite: false,
            ..BuildOptions::default()
        };
        let report = site.build(&keep).unwrap();
        assert_eq!(report.total_skipped(), 6);
        assert_eq!(
            std::fs::read_to_string(dest.join("hello_world.html")).unwrap(),
            "edited by hand"
        );
    }

    #[test]
    fn build_selection_respects_order_and_rejects_unknowns() {
        let site = ship_site();
        let tmp = tempfile::tempdir().unwrap();
        let opts = BuildOptions {
            dest: tmp.path().join("out"),
            views: vec!["cruise_report".to_string(), "home".to_string()],
            ..BuildOptions::default()
        };
        let report = site.build(&opts).unwrap();
        assert_eq!(report.pages[0].name, "cruise_report");
        assert_eq!(report.pages[1].name, "home");

        let bad = BuildOptions {
            dest: tmp.path().join("out"),
            views: vec!["missing".to_string()],
            ..BuildOptions::default()
        };
        assert!(matches!(
            site.build(&bad),
            Err(BuildError::UnknownView(name)) if name == "missing"
        ));
    }

    #[test]
    fn views_can_link_while_rendering() {
        let mut site = Builder::new();
        site.register("home", "/home.html", ValueSources::new(), |_ctx, _vars| {
            Ok("home".to_string())
        })
        .unwrap();
        site.register(
            "deep",
            "/a/<int:n>/",
            ValueSources::new().with("n", ValueList::ints([7])),
            |ctx, _vars| {
                let home = ctx.url_for("home", &[])?;
                Ok(format!("<a href='{home}'>home</a>"))
            },
        )
        .unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let opts = BuildOptions {
            dest: tmp.path().join("out"),
            ..BuildOptions::default()
        };
        site.build(&opts).unwrap();
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("out/a/7/index.html")).unwrap(),
            "<a href='../../home.html'>home</a>"
        );
    }

    #[test]
    fn build_options_follow_the_config() {
        let config: SiteConfig =
            toml::from_str("dest = \"public\"\n[build]\noverwrite = false\n").unwrap();
        let opts = BuildOptions::from_config(&config);
        assert_eq!(opts.dest, PathBuf::from("public"));
        assert!(!opts.overwrite);
        assert_eq!(opts.dir_mode, Mode(0o755));
    }

    #[test]
    fn custom_static_inputs_are_deployed() {
        let tmp = tempfile::tempdir().unwrap();
        let css = tmp.path().join("my.css");
        std::fs::write(&css, "body{}").unwrap();
        let icon = tmp.path().join("icon.ico");
        std::fs::write(&icon, "ico").unwrap();
        let assets = tmp.path().join("assets");
        std::fs::create_dir(&assets).unwrap();
        std::fs::write(assets.join("nav.js"), "//js").unwrap();

        let mut site = Builder::new();
        site.set_stylesheet(&css);
        site.set_favicon(&icon);
        site.set_assets_dir(&assets);
        site.register("home", "/index.html", ValueSources::new(), static_view("x"))
            .unwrap();

        let dest = tmp.path().join("out");
        let opts = BuildOptions {
            dest: dest.clone(),
            ..BuildOptions::default()
        };
        site.build(&opts).unwrap();
        assert_eq!(
            std::fs::read_to_string(dest.join("static/stylesheet.css")).unwrap(),
            "body{}"
        );
        assert!(dest.join("static/favicon.ico").is_file());
        assert!(dest.join("static/nav.js").is_file());
    }

    #[test]
    fn a_failing_view_aborts_the_build() {
        let mut site = Builder::new();
        site.register("ok", "/ok.html", ValueSources::new(), static_view("fine"))
            .unwrap();
        site.register("bad", "/bad.html", ValueSources::new(), |_ctx, _vars| {
            Err(BuildError::View("no data for this page".to_string()))
        })
        .unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let opts = BuildOptions {
            dest: tmp.path().join("out"),
            ..BuildOptions::default()
        };
        let err = site.build(&opts).unwrap_err();
        assert!(matches!(err, BuildError::View(_)));
    }

    #[test]
    fn report_serializes_for_the_manifest() {
        let site = ship_site();
        let tmp = tempfile::tempdir().unwrap();
        let opts = BuildOptions {
            dest: tmp.path().join("out"),
            ..BuildOptions::default()
        };
        let report = site.build(&opts).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pages"][0]["name"], "home");
    }
}

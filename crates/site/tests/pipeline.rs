use goku_core::{
    BufferCapacities, MarkdownModule, MarkdownOptions, Page, TransformChannel, TransformError,
};
use goku_site::{
    BatchOptions, ComponentExports, ComponentRegistry, MemorySource, PageAssembler, PipelineError,
    SiteConfig, Stage, TemplateStore, Theme,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn assembler_with(
    capacities: BufferCapacities,
    templates: &[(&str, &str)],
    components: MemorySource,
) -> PageAssembler {
    PageAssembler::new(
        Arc::new(TransformChannel::new(MarkdownModule::default(), capacities)),
        Arc::new(ComponentRegistry::new(components)),
        Arc::new(TemplateStore::from_map(templates.iter().copied())),
        Arc::new(Theme::default()),
    )
}

fn assembler(templates: &[(&str, &str)], components: MemorySource) -> PageAssembler {
    assembler_with(BufferCapacities::default(), templates, components)
}

fn button() -> MemorySource {
    MemorySource::new().with(
        "button.js",
        ComponentExports::markup("<button>Click</button>").with_script("console.log(1)"),
    )
}

#[test]
fn builds_the_hello_page() {
    let assembler = assembler(
        &[(
            "page.html",
            "<h1>{{& title }}</h1>{{& component button.js }}{{& content }}",
        )],
        button(),
    );
    let page = Page::parse("index.md", "---\ntemplate: page.html\ntitle: Hello\n---\n# Hi").unwrap();

    let doc = assembler.build(&page).unwrap();
    assert_eq!(
        doc.html,
        "<h1>Hello</h1><button>Click</button><h1>Hi</h1><script data-component=\"button.js\">console.log(1)</script>"
    );
    assert!(!doc.html.contains("{{&"));
    assert_eq!(doc.assets.len(), 1);
}

#[test]
fn repeated_component_renders_each_time_but_ships_assets_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let components = MemorySource::new().with(
        "tab.js",
        ComponentExports::render(move |props| {
            counter.fetch_add(1, Ordering::SeqCst);
            format!("<li>{}</li>", props.get("label").map_or("", String::as_str))
        })
        .with_script("tabs()")
        .with_style("li{}"),
    );
    let assembler = assembler(
        &[(
            "tabs.html",
            "<head>{{& styles }}</head><ul>{{& component tab.js label=\"One\" }}{{& component tab.js label=\"Two\" }}{{& component tab.js label=\"Three\" }}</ul>{{& scripts }}",
        )],
        components,
    );
    let page = Page::parse("tabs.md", "---\ntemplate: tabs.html\n---\n").unwrap();

    let doc = assembler.build(&page).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    insta::assert_snapshot!(doc.html, @r#"<head><style data-component="tab.js">li{}</style></head><ul><li>One</li><li>Two</li><li>Three</li></ul><script data-component="tab.js">tabs()</script>"#);
    assert_eq!(doc.html.matches("<script").count(), 1);
}

#[test]
fn fresh_caches_produce_identical_output() {
    let templates = [(
        "page.html",
        "<html><head><title>{{& title }}</title></head><body>{{& component button.js }}{{& content }}</body></html>",
    )];
    let page = Page::parse(
        "index.md",
        "---\ntemplate: page.html\ntitle: Same\n---\nSome *text*",
    )
    .unwrap();

    let first = assembler(&templates, button()).build(&page).unwrap();
    let second = assembler(&templates, button()).build(&page).unwrap();
    assert_eq!(first, second);
    insta::assert_snapshot!(first.html, @r#"<html><head><title>Same</title></head><body><button>Click</button><p>Some <em>text</em></p><script data-component="button.js">console.log(1)</script></body></html>"#);
}

#[test]
fn component_output_is_never_transformed() {
    let components = MemorySource::new().with(
        "literal.js",
        ComponentExports::markup("# not a heading *or emphasis*"),
    );
    let assembler = assembler(
        &[("page.html", "{{& component literal.js }}|{{& content }}")],
        components,
    );
    let page = Page::parse("index.md", "---\ntemplate: page.html\n---\n**bold**").unwrap();

    let doc = assembler.build(&page).unwrap();
    assert_eq!(
        doc.html,
        "# not a heading *or emphasis*|<p><strong>bold</strong></p>"
    );
}

#[test]
fn raw_html_passthrough_leaves_component_fragments_alone() {
    let fragment = "<em>*x*</em>\n# y\n<!-- {{ kept }} -->";
    let assembler = PageAssembler::new(
        Arc::new(TransformChannel::new(
            MarkdownModule::new(MarkdownOptions {
                allow_raw_html: true,
                ..MarkdownOptions::default()
            }),
            BufferCapacities::default(),
        )),
        Arc::new(ComponentRegistry::new(
            MemorySource::new().with("md.js", ComponentExports::markup(fragment)),
        )),
        Arc::new(TemplateStore::from_map([(
            "page.html",
            "<main>{{& component md.js }}</main><article>{{& content }}</article>",
        )])),
        Arc::new(Theme::default()),
    );
    let page = Page::parse(
        "raw.md",
        "---\ntemplate: page.html\n---\n<div class=\"note\">raw</div>\n\n*emph* and <b>bold</b>",
    )
    .unwrap();

    let doc = assembler.build(&page).unwrap();
    assert!(
        doc.html.starts_with(&format!("<main>{fragment}</main><article>")),
        "{}",
        doc.html
    );
    assert!(doc.html.contains("<div class=\"note\">raw</div>"));
    assert!(doc.html.contains("<em>emph</em> and <b>bold</b>"));
    assert_eq!(doc.html.matches(fragment).count(), 1);
}

#[test]
fn assets_survive_documents_without_end_tags() {
    let assembler = assembler(
        &[(
            "page.html",
            "<!doctype html><html><head><title>{{& title }}</title><body>{{& component button.js }}",
        )],
        button(),
    );
    let page = Page::parse("index.md", "---\ntemplate: page.html\ntitle: Open\n---\n").unwrap();

    let doc = assembler.build(&page).unwrap();
    assert_eq!(
        doc.html,
        "<!doctype html><html><head><title>Open</title><body><button>Click</button><script data-component=\"button.js\">console.log(1)</script>"
    );
}

#[test]
fn output_buffer_boundary_is_exact() {
    let templates = [("page.html", "{{& content }}")];
    let page = Page::parse("index.md", "---\ntemplate: page.html\n---\n# Hi").unwrap();
    let html_len = "<h1>Hi</h1>".len();

    let exact = assembler_with(
        BufferCapacities {
            input: 64,
            output: html_len,
        },
        &templates,
        MemorySource::new(),
    );
    assert_eq!(exact.build(&page).unwrap().html, "<h1>Hi</h1>");

    let short = assembler_with(
        BufferCapacities {
            input: 64,
            output: html_len - 1,
        },
        &templates,
        MemorySource::new(),
    );
    let err = short.build(&page).unwrap_err();
    assert_eq!(err.stage, Stage::Transform);
    assert!(matches!(
        err.source,
        PipelineError::Transform(TransformError::OutputOverflow { .. })
    ));
}

#[test]
fn self_recursive_component_is_rejected() {
    let components = MemorySource::new().with(
        "loop.js",
        ComponentExports::markup("<div>{{& component loop.js }}</div>").nested(),
    );
    let assembler = assembler(&[("page.html", "{{& component loop.js }}")], components);
    let page = Page::parse("index.md", "---\ntemplate: page.html\n---\n").unwrap();

    let err = assembler.build(&page).unwrap_err();
    assert_eq!(
        err.stage,
        Stage::Resolve {
            directive: "{{& component loop.js }}".to_string()
        }
    );
    assert!(matches!(
        err.source,
        PipelineError::TemplateRecursionLimitExceeded { limit: 16, .. }
    ));
}

#[test]
fn page_without_template_is_rejected() {
    let assembler = assembler(&[], MemorySource::new());
    let page = Page::parse("index.md", "# Hi").unwrap();
    let err = assembler.build(&page).unwrap_err();
    assert_eq!(
        err.to_string(),
        "page index.md: validate failed: front-matter has no `template` reference"
    );
}

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn builds_a_site_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "goku.yaml",
        "theme:\n  slots:\n    footer: <footer>goku</footer>\nmaxThreads: 2\n",
    );
    write(
        root,
        "templates/page.html",
        "<html><head><title>{{& title }}</title></head><body>{{& component ui/button.html label=\"Go\" }}{{& content }}{{& footer }}</body></html>",
    );
    write(
        root,
        "components/ui/button.html",
        "<button>{{ label }}</button>\n\n<script>\ngo()\n</script>\n\n<style>\nbutton { color: red; }\n</style>\n",
    );
    write(
        root,
        "pages/index.md",
        "---\ntemplate: page.html\ntitle: Home & away\n---\n# Welcome",
    );
    write(
        root,
        "pages/broken.md",
        "---\ntemplate: missing.html\n---\nnothing\n",
    );

    let config = SiteConfig::load(&root.join("goku.yaml")).unwrap();
    let assembler = PageAssembler::from_config(&config);
    let pages = vec![
        Page::from_file(&root.join("pages/index.md")).unwrap(),
        Page::from_file(&root.join("pages/broken.md")).unwrap(),
    ];

    let report = assembler.build_all(&pages, &BatchOptions::from_config(&config));
    assert_eq!(report.stats.total, 2);
    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(report.stats.failed, 1);

    let doc = report.results[0].as_ref().unwrap();
    insta::assert_snapshot!(doc.html, @r#"<html><head><title>Home &amp; away</title><style data-component="ui/button.html">button { color: red; }</style></head><body><button>Go</button><h1>Welcome</h1><footer>goku</footer><script data-component="ui/button.html">go()</script></body></html>"#);

    let err = report.results[1].as_ref().unwrap_err();
    assert_eq!(err.stage, Stage::LoadTemplate);
    assert!(matches!(
        err.source,
        PipelineError::TemplateNotFound { ref id } if id == "missing.html"
    ));
}

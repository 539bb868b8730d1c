use goku_core::{
    BufferCapacities, MarkdownModule, MarkdownOptions, Page, TransformChannel, TransformError,
};

fn markdown_channel(options: MarkdownOptions) -> TransformChannel {
    TransformChannel::new(MarkdownModule::new(options), BufferCapacities::default())
}

#[test]
fn page_body_transforms_to_html() {
    let page = Page::parse(
        "guide.md",
        "---\ntemplate: doc.html\ntitle: Guide\n---\n# Guide\n\n- one\n- ~~two~~",
    )
    .unwrap();
    assert_eq!(page.template().as_deref(), Some("doc.html"));

    let html = markdown_channel(MarkdownOptions::default())
        .transform(page.body())
        .unwrap();
    insta::assert_snapshot!(html, @r"
    <h1>Guide</h1>
    <ul>
    <li>one</li>
    <li><del>two</del></li>
    </ul>
    ");
}

#[test]
fn raw_html_in_bodies_is_escaped_unless_allowed() {
    let body = "<div class=\"x\">hi</div>";
    let escaped = markdown_channel(MarkdownOptions::default())
        .transform(body)
        .unwrap();
    assert!(!escaped.contains("<div"));

    let raw = markdown_channel(MarkdownOptions {
        allow_raw_html: true,
        ..MarkdownOptions::default()
    })
    .transform(body)
    .unwrap();
    assert_eq!(raw, body);
}

#[test]
fn oversized_body_is_rejected_before_the_module_runs() {
    let channel = TransformChannel::new(
        MarkdownModule::default(),
        BufferCapacities {
            input: 4,
            output: 1024,
        },
    );
    assert_eq!(
        channel.transform("# Too long"),
        Err(TransformError::InputOverflow {
            len: 10,
            capacity: 4
        })
    );
}

pub const BLOCK_TEMPLATE: &str = "<div class=box><p>hello <b>world</b> &amp; <a href=\"/x\" onclick=\"y()\">link</a></p><img src=\"/i.png\" alt=x><span style=\"color: red; position: fixed\">s</span><script>x</script></div>\n";

pub fn make_blocks(blocks: usize) -> String {
    let mut html = String::with_capacity(BLOCK_TEMPLATE.len() * blocks);
    for _ in 0..blocks {
        html.push_str(BLOCK_TEMPLATE);
    }
    html
}

/// `depth` nested openers closed in the wrong order, so every closer but the last triggers
/// premature-closing recovery.
pub fn make_bad_nesting(depth: usize) -> String {
    let mut html = String::with_capacity(depth * 12);
    for _ in 0..depth {
        html.push_str("<div><em>");
    }
    for _ in 0..depth {
        html.push_str("</div>");
    }
    html
}

/// `count` openers followed by `count` closers of a tag that is never open, so every closer
/// is a stray one.
pub fn make_stray_closers(count: usize) -> String {
    let mut html = String::with_capacity(count * 9);
    for _ in 0..count {
        html.push_str("<em>");
    }
    for _ in 0..count {
        html.push_str("</ol>");
    }
    html
}

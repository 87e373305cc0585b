#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Invariant {
    Idempotence,
    EscapeTotality,
    BalancedEmission,
    DenyByDefault,
    RequiredAttributeAtomicity,
    NestingDeterminism,
    CssIsolation,
}

impl Invariant {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idempotence => "idempotence",
            Self::EscapeTotality => "escape totality",
            Self::BalancedEmission => "balanced emission",
            Self::DenyByDefault => "deny by default",
            Self::RequiredAttributeAtomicity => "required attribute atomicity",
            Self::NestingDeterminism => "nesting determinism",
            Self::CssIsolation => "css isolation",
        }
    }
}

impl std::fmt::Display for Invariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Expectation {
    MustPass,
    AllowedToFail { allowed: &'static [AllowedFailure] },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AllowedFailure {
    pub invariant: Invariant,
    pub reason: &'static str,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FixtureKind {
    Nesting,
    Attribute,
    Style,
    Text,
    TagName,
    Comment,
}

#[derive(Clone, Copy, Debug)]
pub struct GoldenFixture {
    pub name: &'static str,
    pub input: &'static str,
    pub covers: &'static str,
    pub tags: &'static [&'static str],
    pub invariants: &'static [Invariant],
    pub expectation: Expectation,
    pub kind: FixtureKind,
}

const MARKUP: &[Invariant] = &[
    Invariant::Idempotence,
    Invariant::EscapeTotality,
    Invariant::BalancedEmission,
    Invariant::DenyByDefault,
];

const NESTING: &[Invariant] = &[
    Invariant::Idempotence,
    Invariant::EscapeTotality,
    Invariant::BalancedEmission,
    Invariant::NestingDeterminism,
];

const REQUIRED: &[Invariant] = &[
    Invariant::Idempotence,
    Invariant::EscapeTotality,
    Invariant::BalancedEmission,
    Invariant::RequiredAttributeAtomicity,
];

const STYLE: &[Invariant] = &[
    Invariant::Idempotence,
    Invariant::EscapeTotality,
    Invariant::DenyByDefault,
    Invariant::CssIsolation,
];

const SANITIZE_CORPUS_V1: &[GoldenFixture] = &[
    GoldenFixture {
        name: "nesting_premature_closer",
        input: "<p><em>a</p></em>",
        covers: "Closer of an outer tag while an inner one is open.",
        tags: &["nesting", "premature"],
        invariants: NESTING,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Nesting,
    },
    GoldenFixture {
        name: "nesting_stray_closer",
        input: "<div></span>x</div>",
        covers: "Closer with no opener anywhere on the stack.",
        tags: &["nesting", "stray"],
        invariants: NESTING,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Nesting,
    },
    GoldenFixture {
        name: "nesting_implied_list_items",
        input: "<ul><li>one<li>two</ul>",
        covers: "Implicitly closed list items are dropped, the list survives.",
        tags: &["nesting", "list", "implied-end"],
        invariants: NESTING,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Nesting,
    },
    GoldenFixture {
        name: "nesting_interleaved_formatting",
        input: "<b><i>x</b></i>",
        covers: "Interleaved formatting tags through aliases.",
        tags: &["nesting", "alias", "interleaved"],
        invariants: NESTING,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Nesting,
    },
    GoldenFixture {
        name: "nesting_unclosed_tail",
        input: "<div><p>text<br>more",
        covers: "Openers left on the stack at end of input.",
        tags: &["nesting", "unclosed"],
        invariants: NESTING,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Nesting,
    },
    GoldenFixture {
        name: "attr_event_handler",
        input: "<a href=\"https://x.test/\" onclick=\"alert(1)\">x</a>",
        covers: "Event handler attributes are dropped from an allowed tag.",
        tags: &["attribute", "event-handler"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "attr_required_missing",
        input: "<a name=x>y</a>",
        covers: "Missing required attribute keeps both sides escaped.",
        tags: &["attribute", "required", "missing"],
        invariants: REQUIRED,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "attr_required_bad_url",
        input: "<a href=\"javascript:alert(1)\">x</a>",
        covers: "Required attribute failing its checker.",
        tags: &["attribute", "required", "checker", "url"],
        invariants: REQUIRED,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "attr_image_script_url",
        input: "<img src=\"javascript:alert(1)\">",
        covers: "Single tag with a failing required attribute.",
        tags: &["attribute", "required", "single", "imgurl"],
        invariants: REQUIRED,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "attr_image_data_url",
        input: "<img src=\"data:image/png;base64,AAAA\" alt=\"\">",
        covers: "Inline image data passes the image checker.",
        tags: &["attribute", "single", "imgurl", "empty-value"],
        invariants: REQUIRED,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "attr_unterminated_quote",
        input: "<p title=\"x>y</p>",
        covers: "Unterminated quote discards all attributes of the tag.",
        tags: &["attribute", "quote", "unterminated"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "attr_duplicate_keys",
        input: "<p id=a ID=\"b\" class='c'>x</p>",
        covers: "Duplicate keys in different case collapse to one attribute.",
        tags: &["attribute", "duplicate", "case"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "attr_value_tail",
        input: "<p title=\"x\"tail lang=en>y</p>",
        covers: "Text glued to a closing quote is discarded.",
        tags: &["attribute", "quote", "tail"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Attribute,
    },
    GoldenFixture {
        name: "style_mixed_declarations",
        input: "<span style=\"color: red; position: fixed; background: none\">x</span>",
        covers: "Invalid declarations are dropped, valid ones kept.",
        tags: &["style", "mixed"],
        invariants: STYLE,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Style,
    },
    GoldenFixture {
        name: "style_nothing_valid",
        input: "<div style=\"position: absolute; z-index: 99\">x</div>",
        covers: "Style attribute removed entirely, host tag still rendered.",
        tags: &["style", "empty"],
        invariants: STYLE,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Style,
    },
    GoldenFixture {
        name: "text_literal_references",
        input: "&lt;script&gt; &amp;lt; 5 > 3 & 2 < 4",
        covers: "Literal references and bare markup characters in text.",
        tags: &["text", "entity", "protection"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Text,
    },
    GoldenFixture {
        name: "text_utf8",
        input: "é<em>ï</em>ö>",
        covers: "Non-ASCII text around tags and a trailing literal `>`.",
        tags: &["text", "utf8"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Text,
    },
    GoldenFixture {
        name: "tag_unknown_elements",
        input: "<script>alert(1)</script><svg onload=x><iframe src=//x>",
        covers: "Tags absent from the policy stay escaped.",
        tags: &["tag-name", "unknown"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::TagName,
    },
    GoldenFixture {
        name: "tag_self_closing_forms",
        input: "<br/><hr /><p/></br>",
        covers: "XML-style self-closing on single and paired tags.",
        tags: &["tag-name", "single", "self-closing"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::TagName,
    },
    GoldenFixture {
        name: "tag_alias_chain",
        input: "<strike>x</strike><tt>y</tt><acronym>z</acronym>",
        covers: "Alias chains resolve to their final tag.",
        tags: &["tag-name", "alias"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::TagName,
    },
    GoldenFixture {
        name: "comment_hides_markup",
        input: "a<!-- <b> -->b<!-- unterminated <i>",
        covers: "Stripped comments, including an unterminated one.",
        tags: &["comment", "unterminated"],
        invariants: MARKUP,
        expectation: Expectation::MustPass,
        kind: FixtureKind::Comment,
    },
];

pub fn fixtures() -> &'static [GoldenFixture] {
    SANITIZE_CORPUS_V1
}

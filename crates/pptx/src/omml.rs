//! Office Math (OMML) elements to formula trees.

use crate::xml::XmlNode;
use deck_core::formula::FractionKind;
use deck_core::MathNode;

/// Convert an `m:oMathPara` or `m:oMath` element.
pub fn parse_math(node: &XmlNode) -> MathNode {
    match node.name.as_str() {
        "oMathPara" => {
            let equations: Vec<MathNode> = node.children_named("oMath").map(container).collect();
            match equations.len() {
                1 => equations.into_iter().next().unwrap_or_else(empty),
                _ => MathNode::EqArray(equations),
            }
        }
        _ => container(node),
    }
}

fn empty() -> MathNode {
    MathNode::Group(Vec::new())
}

fn boxed(node: MathNode) -> Box<MathNode> {
    Box::new(node)
}

/// Argument elements (`e`, `num`, `sub`, ...) and `oMath` itself: the
/// converted children, unwrapped when there is exactly one.
fn container(node: &XmlNode) -> MathNode {
    let mut items: Vec<MathNode> = node
        .elements()
        .filter(|child| !is_property(child))
        .filter_map(element)
        .collect();
    match items.len() {
        1 => items.pop().unwrap_or_else(empty),
        _ => MathNode::Group(items),
    }
}

/// Converted child argument, or an empty group if it is missing.
fn arg(node: &XmlNode, name: &str) -> MathNode {
    node.child(name).map(container).unwrap_or_else(empty)
}

/// Child argument that is absent when missing or empty.
fn optional_arg(node: &XmlNode, name: &str) -> Option<Box<MathNode>> {
    let child = node.child(name)?;
    if child.elements().all(is_property) {
        return None;
    }
    Some(boxed(container(child)))
}

fn is_property(node: &XmlNode) -> bool {
    node.name.ends_with("Pr")
}

/// `m:val` of a property child, e.g. `naryPr/chr`.
fn property<'a>(node: &'a XmlNode, props: &str, name: &str) -> Option<&'a str> {
    node.child(props)?.child(name)?.attr("val")
}

/// A character property; an explicitly empty value means "none".
fn char_property(node: &XmlNode, props: &str, name: &str, default: Option<char>) -> Option<char> {
    match property(node, props, name) {
        Some(value) => value.chars().next(),
        None => default,
    }
}

fn flag_property(node: &XmlNode, props: &str, name: &str) -> bool {
    // A flag element without m:val means on.
    match node.child(props).and_then(|p| p.child(name)) {
        Some(flag) => !matches!(flag.attr("val"), Some("0" | "off" | "false")),
        None => false,
    }
}

fn element(node: &XmlNode) -> Option<MathNode> {
    let converted = match node.name.as_str() {
        "r" => MathNode::Run(node.text_of_t()),
        "t" => MathNode::Run(node.text()),
        "f" => {
            let kind = match property(node, "fPr", "type") {
                Some("lin") => FractionKind::Linear,
                Some("noBar") => FractionKind::NoBar,
                _ => FractionKind::Bar,
            };
            MathNode::Fraction {
                numerator: boxed(arg(node, "num")),
                denominator: boxed(arg(node, "den")),
                kind,
            }
        }
        "rad" => {
            let index = if flag_property(node, "radPr", "degHide") {
                None
            } else {
                optional_arg(node, "deg")
            };
            MathNode::Radical {
                base: boxed(arg(node, "e")),
                index,
            }
        }
        "sSup" => MathNode::Superscript {
            base: boxed(arg(node, "e")),
            sup: boxed(arg(node, "sup")),
        },
        "sSub" => MathNode::Subscript {
            base: boxed(arg(node, "e")),
            sub: boxed(arg(node, "sub")),
        },
        "sSubSup" => MathNode::SubSup {
            base: boxed(arg(node, "e")),
            sub: boxed(arg(node, "sub")),
            sup: boxed(arg(node, "sup")),
        },
        "sPre" => MathNode::PreScript {
            base: boxed(arg(node, "e")),
            sub: boxed(arg(node, "sub")),
            sup: boxed(arg(node, "sup")),
        },
        "m" => MathNode::Matrix(
            node.children_named("mr")
                .map(|row| row.children_named("e").map(container).collect())
                .collect(),
        ),
        "nary" => {
            let operator = char_property(node, "naryPr", "chr", Some('∫')).unwrap_or('∫');
            let sub = if flag_property(node, "naryPr", "subHide") {
                None
            } else {
                optional_arg(node, "sub")
            };
            let sup = if flag_property(node, "naryPr", "supHide") {
                None
            } else {
                optional_arg(node, "sup")
            };
            MathNode::Nary {
                operator,
                sub,
                sup,
                body: boxed(arg(node, "e")),
            }
        }
        "func" => MathNode::Function {
            name: boxed(arg(node, "fName")),
            argument: boxed(arg(node, "e")),
        },
        "d" => MathNode::Delimiter {
            open: char_property(node, "dPr", "begChr", Some('(')),
            close: char_property(node, "dPr", "endChr", Some(')')),
            separator: char_property(node, "dPr", "sepChr", Some('|')).unwrap_or('|'),
            items: node.children_named("e").map(container).collect(),
        },
        "acc" => MathNode::Accent {
            accent: char_property(node, "accPr", "chr", Some('\u{0302}')).unwrap_or('\u{0302}'),
            base: boxed(arg(node, "e")),
        },
        "bar" => MathNode::Bar {
            base: boxed(arg(node, "e")),
            top: property(node, "barPr", "pos") == Some("top"),
        },
        "limLow" => MathNode::Limit {
            base: boxed(arg(node, "e")),
            limit: boxed(arg(node, "lim")),
            upper: false,
        },
        "limUpp" => MathNode::Limit {
            base: boxed(arg(node, "e")),
            limit: boxed(arg(node, "lim")),
            upper: true,
        },
        "eqArr" => MathNode::EqArray(node.children_named("e").map(container).collect()),
        "box" | "borderBox" | "groupChr" | "phant" => arg(node, "e"),
        "oMath" | "e" | "num" | "den" | "sub" | "sup" | "deg" | "lim" | "fName" => container(node),
        "bookmarkStart" | "bookmarkEnd" | "proofErr" => return None,
        other => {
            let text = node.text_of_t();
            log::warn!("Unsupported math element <m:{}>, keeping its text", other);
            MathNode::Unknown(text)
        }
    };
    Some(converted)
}

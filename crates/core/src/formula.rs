//! Embedded equation trees and their conversion to LaTeX-style formula markup.
//!
//! Conversion never fails. Unmapped symbols pass through literally and
//! unknown nodes degrade to their plain text.

use serde::{Deserialize, Serialize};

/// Node of an embedded equation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MathNode {
    /// A run of symbols.
    Run(String),
    Fraction {
        numerator: Box<MathNode>,
        denominator: Box<MathNode>,
        kind: FractionKind,
    },
    Radical {
        base: Box<MathNode>,
        index: Option<Box<MathNode>>,
    },
    Superscript {
        base: Box<MathNode>,
        sup: Box<MathNode>,
    },
    Subscript {
        base: Box<MathNode>,
        sub: Box<MathNode>,
    },
    SubSup {
        base: Box<MathNode>,
        sub: Box<MathNode>,
        sup: Box<MathNode>,
    },
    /// Scripts placed before the base.
    PreScript {
        base: Box<MathNode>,
        sub: Box<MathNode>,
        sup: Box<MathNode>,
    },
    Matrix(Vec<Vec<MathNode>>),
    /// Large operator (sum, integral, ...) with optional limits.
    Nary {
        operator: char,
        sub: Option<Box<MathNode>>,
        sup: Option<Box<MathNode>>,
        body: Box<MathNode>,
    },
    /// Function application such as `sin x`.
    Function {
        name: Box<MathNode>,
        argument: Box<MathNode>,
    },
    /// Bracketed expression; `items` are separated by `separator`.
    Delimiter {
        open: Option<char>,
        close: Option<char>,
        separator: char,
        items: Vec<MathNode>,
    },
    Accent {
        accent: char,
        base: Box<MathNode>,
    },
    Bar {
        base: Box<MathNode>,
        top: bool,
    },
    Limit {
        base: Box<MathNode>,
        limit: Box<MathNode>,
        upper: bool,
    },
    /// Vertically stacked equations.
    EqArray(Vec<MathNode>),
    Group(Vec<MathNode>),
    /// A node without a markup mapping, carrying its plain text.
    Unknown(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FractionKind {
    #[default]
    Bar,
    Linear,
    NoBar,
}

impl MathNode {
    /// Plain-text approximation of the node.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            MathNode::Run(text) | MathNode::Unknown(text) => out.push_str(text),
            MathNode::Fraction {
                numerator,
                denominator,
                ..
            } => {
                numerator.collect_text(out);
                out.push('/');
                denominator.collect_text(out);
            }
            MathNode::Radical { base, index } => {
                out.push('√');
                if let Some(index) = index {
                    index.collect_text(out);
                }
                base.collect_text(out);
            }
            MathNode::Superscript { base, sup } => {
                base.collect_text(out);
                out.push('^');
                sup.collect_text(out);
            }
            MathNode::Subscript { base, sub } => {
                base.collect_text(out);
                out.push('_');
                sub.collect_text(out);
            }
            MathNode::SubSup { base, sub, sup } | MathNode::PreScript { base, sub, sup } => {
                base.collect_text(out);
                out.push('_');
                sub.collect_text(out);
                out.push('^');
                sup.collect_text(out);
            }
            MathNode::Matrix(rows) => {
                for row in rows {
                    for cell in row {
                        cell.collect_text(out);
                        out.push(' ');
                    }
                }
            }
            MathNode::Nary {
                operator,
                sub,
                sup,
                body,
            } => {
                out.push(*operator);
                for limit in [sub, sup].into_iter().flatten() {
                    limit.collect_text(out);
                }
                body.collect_text(out);
            }
            MathNode::Function { name, argument } => {
                name.collect_text(out);
                out.push(' ');
                argument.collect_text(out);
            }
            MathNode::Delimiter {
                open,
                close,
                separator,
                items,
            } => {
                out.extend(open);
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(*separator);
                    }
                    item.collect_text(out);
                }
                out.extend(close);
            }
            MathNode::Accent { base, .. } | MathNode::Bar { base, .. } => base.collect_text(out),
            MathNode::Limit { base, limit, .. } => {
                base.collect_text(out);
                out.push(' ');
                limit.collect_text(out);
            }
            MathNode::EqArray(nodes) | MathNode::Group(nodes) => {
                for node in nodes {
                    node.collect_text(out);
                }
            }
        }
    }
}

/// Code point to command table for symbol runs.
static SYMBOLS: phf::Map<char, &'static str> = phf::phf_map! {
    // Lowercase Greek
    'α' => "\\alpha",
    'β' => "\\beta",
    'γ' => "\\gamma",
    'δ' => "\\delta",
    'ε' => "\\varepsilon",
    'ϵ' => "\\epsilon",
    'ζ' => "\\zeta",
    'η' => "\\eta",
    'θ' => "\\theta",
    'ϑ' => "\\vartheta",
    'ι' => "\\iota",
    'κ' => "\\kappa",
    'λ' => "\\lambda",
    'μ' => "\\mu",
    'ν' => "\\nu",
    'ξ' => "\\xi",
    'π' => "\\pi",
    'ϖ' => "\\varpi",
    'ρ' => "\\rho",
    'ϱ' => "\\varrho",
    'σ' => "\\sigma",
    'ς' => "\\varsigma",
    'τ' => "\\tau",
    'υ' => "\\upsilon",
    'φ' => "\\varphi",
    'ϕ' => "\\phi",
    'χ' => "\\chi",
    'ψ' => "\\psi",
    'ω' => "\\omega",

    // Uppercase Greek
    'Γ' => "\\Gamma",
    'Δ' => "\\Delta",
    'Θ' => "\\Theta",
    'Λ' => "\\Lambda",
    'Ξ' => "\\Xi",
    'Π' => "\\Pi",
    'Σ' => "\\Sigma",
    'Υ' => "\\Upsilon",
    'Φ' => "\\Phi",
    'Ψ' => "\\Psi",
    'Ω' => "\\Omega",

    // Binary operators
    '±' => "\\pm",
    '∓' => "\\mp",
    '×' => "\\times",
    '÷' => "\\div",
    '·' => "\\cdot",
    '⋅' => "\\cdot",
    '∙' => "\\cdot",
    '∘' => "\\circ",
    '∗' => "\\ast",
    '⊕' => "\\oplus",
    '⊗' => "\\otimes",
    '∪' => "\\cup",
    '∩' => "\\cap",
    '∧' => "\\wedge",
    '∨' => "\\vee",
    '∖' => "\\setminus",
    '−' => "-",

    // Relations
    '≤' => "\\leq",
    '≥' => "\\geq",
    '≠' => "\\neq",
    '≈' => "\\approx",
    '≡' => "\\equiv",
    '∼' => "\\sim",
    '≃' => "\\simeq",
    '≅' => "\\cong",
    '∝' => "\\propto",
    '≪' => "\\ll",
    '≫' => "\\gg",
    '≺' => "\\prec",
    '≻' => "\\succ",
    '∈' => "\\in",
    '∉' => "\\notin",
    '∋' => "\\ni",
    '⊂' => "\\subset",
    '⊃' => "\\supset",
    '⊆' => "\\subseteq",
    '⊇' => "\\supseteq",
    '⊥' => "\\perp",
    '∥' => "\\parallel",
    '∣' => "\\mid",
    '⊢' => "\\vdash",
    '⊨' => "\\models",

    // Arrows
    '→' => "\\rightarrow",
    '←' => "\\leftarrow",
    '↔' => "\\leftrightarrow",
    '⇒' => "\\Rightarrow",
    '⇐' => "\\Leftarrow",
    '⇔' => "\\Leftrightarrow",
    '↦' => "\\mapsto",
    '↑' => "\\uparrow",
    '↓' => "\\downarrow",

    // Large operators
    '∑' => "\\sum",
    '∏' => "\\prod",
    '∐' => "\\coprod",
    '∫' => "\\int",
    '∬' => "\\iint",
    '∭' => "\\iiint",
    '∮' => "\\oint",
    '⋃' => "\\bigcup",
    '⋂' => "\\bigcap",
    '⋁' => "\\bigvee",
    '⋀' => "\\bigwedge",

    // Miscellaneous
    '∞' => "\\infty",
    '∂' => "\\partial",
    '∇' => "\\nabla",
    '∀' => "\\forall",
    '∃' => "\\exists",
    '∄' => "\\nexists",
    '∅' => "\\emptyset",
    '¬' => "\\neg",
    '∠' => "\\angle",
    '△' => "\\triangle",
    '∴' => "\\therefore",
    '∵' => "\\because",
    '…' => "\\ldots",
    '⋯' => "\\cdots",
    '⋮' => "\\vdots",
    '⋱' => "\\ddots",
    '′' => "'",
    '″' => "''",
    '°' => "^{\\circ}",
    'ℏ' => "\\hbar",
    'ℓ' => "\\ell",
    'ℵ' => "\\aleph",
    'ℜ' => "\\Re",
    'ℑ' => "\\Im",
    '℘' => "\\wp",
    'ℝ' => "\\mathbb{R}",
    'ℕ' => "\\mathbb{N}",
    'ℤ' => "\\mathbb{Z}",
    'ℚ' => "\\mathbb{Q}",
    'ℂ' => "\\mathbb{C}",
    '⟨' => "\\langle",
    '⟩' => "\\rangle",
    '⌊' => "\\lfloor",
    '⌋' => "\\rfloor",
    '⌈' => "\\lceil",
    '⌉' => "\\rceil",

    // Reserved characters
    '{' => "\\{",
    '}' => "\\}",
    '%' => "\\%",
    '#' => "\\#",
    '&' => "\\&",
    '$' => "\\$",
    '_' => "\\_",
    '\\' => "\\backslash",
};

/// Functions with a dedicated LaTeX command.
const KNOWN_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "coth", "log", "ln", "lg", "exp", "lim", "liminf", "limsup", "max", "min", "sup",
    "inf", "det", "dim", "ker", "deg", "gcd", "arg", "Pr",
];

/// Look up the command for one symbol.
pub fn symbol_command(symbol: char) -> Option<&'static str> {
    SYMBOLS.get(&symbol).copied()
}

/// Translate a symbol run, passing unmapped characters through literally.
pub fn translate_symbols(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_command = false;
    for c in text.chars() {
        match symbol_command(c) {
            Some(command) => {
                if after_command && command.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    out.push(' ');
                }
                out.push_str(command);
                after_command = command.starts_with('\\')
                    && command.ends_with(|c: char| c.is_ascii_alphabetic());
            }
            None => {
                if after_command && c.is_ascii_alphanumeric() {
                    out.push(' ');
                }
                out.push(c);
                after_command = false;
            }
        }
    }
    out
}

/// Convert an equation tree to LaTeX-style markup.
pub fn to_latex(node: &MathNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out.trim().to_string()
}

fn latex(node: &MathNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

/// Brace-wrap unless the markup is a single character.
fn group(markup: &str) -> String {
    if markup.chars().count() == 1 {
        markup.to_string()
    } else {
        format!("{{{}}}", markup)
    }
}

fn write_node(node: &MathNode, out: &mut String) {
    match node {
        MathNode::Run(text) | MathNode::Unknown(text) => {
            let translated = translate_symbols(text);
            // Keep a command from gluing onto a following letter.
            if ends_with_command(out) && translated.starts_with(|c: char| c.is_ascii_alphanumeric())
            {
                out.push(' ');
            }
            out.push_str(&translated);
        }
        MathNode::Fraction {
            numerator,
            denominator,
            kind,
        } => {
            let (num, den) = (latex(numerator), latex(denominator));
            match kind {
                FractionKind::Bar => out.push_str(&format!("\\frac{{{}}}{{{}}}", num, den)),
                FractionKind::Linear => out.push_str(&format!("{}/{}", group(&num), group(&den))),
                FractionKind::NoBar => {
                    out.push_str(&format!("\\genfrac{{}}{{}}{{0pt}}{{}}{{{}}}{{{}}}", num, den))
                }
            }
        }
        MathNode::Radical { base, index } => {
            let index = index.as_deref().map(latex).unwrap_or_default();
            if index.trim().is_empty() {
                out.push_str(&format!("\\sqrt{{{}}}", latex(base)));
            } else {
                out.push_str(&format!("\\sqrt[{}]{{{}}}", index, latex(base)));
            }
        }
        MathNode::Superscript { base, sup } => {
            out.push_str(&format!("{}^{{{}}}", group(&latex(base)), latex(sup)));
        }
        MathNode::Subscript { base, sub } => {
            out.push_str(&format!("{}_{{{}}}", group(&latex(base)), latex(sub)));
        }
        MathNode::SubSup { base, sub, sup } => {
            out.push_str(&format!(
                "{}_{{{}}}^{{{}}}",
                group(&latex(base)),
                latex(sub),
                latex(sup)
            ));
        }
        MathNode::PreScript { base, sub, sup } => {
            out.push_str(&format!(
                "{{}}_{{{}}}^{{{}}}{}",
                latex(sub),
                latex(sup),
                group(&latex(base))
            ));
        }
        MathNode::Matrix(rows) => {
            let body = rows
                .iter()
                .map(|row| row.iter().map(latex).collect::<Vec<_>>().join(" & "))
                .collect::<Vec<_>>()
                .join(" \\\\ ");
            out.push_str(&format!("\\begin{{matrix}} {} \\end{{matrix}}", body));
        }
        MathNode::Nary {
            operator,
            sub,
            sup,
            body,
        } => {
            match symbol_command(*operator) {
                Some(command) => out.push_str(command),
                None => out.push(*operator),
            }
            if let Some(sub) = sub {
                let sub = latex(sub);
                if !sub.is_empty() {
                    out.push_str(&format!("_{{{}}}", sub));
                }
            }
            if let Some(sup) = sup {
                let sup = latex(sup);
                if !sup.is_empty() {
                    out.push_str(&format!("^{{{}}}", sup));
                }
            }
            out.push_str(&format!("{{{}}}", latex(body)));
        }
        MathNode::Function { name, argument } => {
            out.push_str(&function_name(&name.plain_text(), || latex(name)));
            out.push_str(&format!("{{{}}}", latex(argument)));
        }
        MathNode::Delimiter {
            open,
            close,
            separator,
            items,
        } => {
            let separator = format!(" {} ", delimiter_markup(Some(*separator)));
            let body = items.iter().map(latex).collect::<Vec<_>>().join(&separator);
            out.push_str(&format!(
                "\\left{} {} \\right{}",
                delimiter_markup(*open),
                body,
                delimiter_markup(*close)
            ));
        }
        MathNode::Accent { accent, base } => match accent_command(*accent) {
            Some(command) => out.push_str(&format!("{}{{{}}}", command, latex(base))),
            None => {
                log::warn!("No markup for accent U+{:04X}, dropping it", *accent as u32);
                write_node(base, out);
            }
        },
        MathNode::Bar { base, top } => {
            let command = if *top { "\\overline" } else { "\\underline" };
            out.push_str(&format!("{}{{{}}}", command, latex(base)));
        }
        MathNode::Limit { base, limit, upper } => {
            let base_text = base.plain_text();
            let base_text = base_text.trim();
            if KNOWN_FUNCTIONS.contains(&base_text) {
                let script = if *upper { '^' } else { '_' };
                out.push_str(&format!("\\{}{}{{{}}}", base_text, script, latex(limit)));
            } else {
                let command = if *upper { "\\overset" } else { "\\underset" };
                out.push_str(&format!("{}{{{}}}{{{}}}", command, latex(limit), latex(base)));
            }
        }
        MathNode::EqArray(rows) => {
            let body = rows.iter().map(latex).collect::<Vec<_>>().join(" \\\\ ");
            out.push_str(&format!("\\begin{{array}}{{l}} {} \\end{{array}}", body));
        }
        MathNode::Group(nodes) => {
            for node in nodes {
                write_node(node, out);
            }
        }
    }
}

fn ends_with_command(markup: &str) -> bool {
    match markup.rfind('\\') {
        Some(pos) => {
            let tail = &markup[pos + 1..];
            !tail.is_empty() && tail.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

fn function_name(plain: &str, markup: impl FnOnce() -> String) -> String {
    let plain = plain.trim();
    if KNOWN_FUNCTIONS.contains(&plain) {
        format!("\\{}", plain)
    } else if !plain.is_empty() && plain.chars().all(|c| c.is_ascii_alphabetic()) {
        format!("\\operatorname{{{}}}", plain)
    } else {
        markup()
    }
}

fn delimiter_markup(delimiter: Option<char>) -> &'static str {
    match delimiter {
        None => ".",
        Some('(') => "(",
        Some(')') => ")",
        Some('[') => "[",
        Some(']') => "]",
        Some('{') => "\\{",
        Some('}') => "\\}",
        Some('|') => "|",
        Some('‖') => "\\|",
        Some('⟨') => "\\langle",
        Some('⟩') => "\\rangle",
        Some('⌊') => "\\lfloor",
        Some('⌋') => "\\rfloor",
        Some('⌈') => "\\lceil",
        Some('⌉') => "\\rceil",
        Some('/') => "/",
        Some(_) => ".",
    }
}

fn accent_command(accent: char) -> Option<&'static str> {
    match accent {
        '\u{0302}' | '^' => Some("\\hat"),
        '\u{0303}' | '~' => Some("\\tilde"),
        '\u{0307}' => Some("\\dot"),
        '\u{0308}' => Some("\\ddot"),
        '\u{20D7}' | '\u{20D1}' => Some("\\vec"),
        '\u{0305}' | '\u{00AF}' => Some("\\bar"),
        '\u{0301}' => Some("\\acute"),
        '\u{0300}' => Some("\\grave"),
        '\u{0306}' => Some("\\breve"),
        '\u{030C}' => Some("\\check"),
        _ => None,
    }
}

//! # Signature Translator
//!
//! Turns a demangled export name such as `ex_dirlist(path: string) -> sequence<string>`
//! into a `Signature` over the closed `TypeDescriptor` model.
//!
//! ## Invariants
//! - **Closed vocabulary**: A type token maps to a descriptor only through the tables below.
//!   Anything else is `UnsupportedType` for that one symbol.
//! - **Nesting aware**: Commas, colons and semicolons only split at bracket depth zero, and
//!   brackets must balance with their own kind.
//! - **Bounded**: Bracket nesting deeper than `MAX_NESTING` is `Malformed`.

use std::fmt;

use cmdpack::TypeDescriptor;
use serde::Deserialize;
use serde::Serialize;

/// Deepest bracket nesting accepted in a signature.
pub const MAX_NESTING: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslateError {
    #[error("unsupported type `{token}`")]
    UnsupportedType { token: String },
    #[error("malformed signature: {reason}")]
    Malformed { reason: String },
}

type Result<T> = std::result::Result<T, TranslateError>;

fn malformed(reason: impl Into<String>) -> TranslateError {
    TranslateError::Malformed { reason: reason.into() }
}

fn unsupported(token: &str) -> TranslateError {
    TranslateError::UnsupportedType { token: token.trim().to_string() }
}

/// A parameter as written, before its type is mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamToken {
    pub name: Option<String>,
    pub ty: String,
}

/// A signature split into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureTokens {
    pub name: String,
    pub params: Vec<ParamToken>,
    pub ret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeDescriptor,
}

/// The translated calling contract of one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Full export name, prefix included.
    pub name: String,
    pub params: Vec<Param>,
    pub ret: TypeDescriptor,
}

impl Signature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", param.name, param.ty)?;
        }
        write!(f, ")")?;
        if self.ret != TypeDescriptor::Void {
            write!(f, " -> {}", self.ret)?;
        }
        Ok(())
    }
}

/// Splits and translates a signature string.
pub fn translate(text: &str) -> Result<Signature> {
    translate_tokens(&split_signature(text)?)
}

/// Maps already split tokens. Unnamed parameters are called `arg0`, `arg1`, ...
pub fn translate_tokens(tokens: &SignatureTokens) -> Result<Signature> {
    let params = tokens
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let name = p.name.clone().unwrap_or_else(|| format!("arg{i}"));
            Ok(Param { name, ty: parse_type(&p.ty)? })
        })
        .collect::<Result<Vec<_>>>()?;
    let ret = match &tokens.ret {
        Some(ret) => parse_type(ret)?,
        None => TypeDescriptor::Void,
    };
    Ok(Signature { name: tokens.name.clone(), params, ret })
}

/// `name(p1, p2, ...) [-> ret]` into its tokens.
pub fn split_signature(text: &str) -> Result<SignatureTokens> {
    let text = text.trim();
    let open = text.find('(').ok_or_else(|| malformed("missing `(`"))?;
    let name = text[..open].trim();
    if name.is_empty() {
        return Err(malformed("missing function name"));
    }

    let close = open + closing_paren(&text[open..])?;
    let rest = text[close + 1..].trim();
    let ret = if rest.is_empty() {
        None
    } else if let Some(ret) = rest.strip_prefix("->") {
        let ret = ret.trim();
        if ret.is_empty() {
            return Err(malformed("missing return type after `->`"));
        }
        Some(ret.to_string())
    } else {
        return Err(malformed(format!("unexpected `{rest}` after the parameter list")));
    };

    let inner = text[open + 1..close].trim();
    let mut params = Vec::new();
    if !inner.is_empty() && inner != "void" {
        for piece in split_top_level(inner, ',')? {
            params.push(param_token(piece)?);
        }
    }

    Ok(SignatureTokens { name: name.to_string(), params, ret })
}

fn param_token(piece: &str) -> Result<ParamToken> {
    let piece = piece.trim();
    if piece.is_empty() {
        return Err(malformed("empty parameter"));
    }
    match name_colon(piece) {
        Some(at) => {
            let name = piece[..at].trim();
            let ty = piece[at + 1..].trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(malformed(format!("bad parameter name in `{piece}`")));
            }
            if ty.is_empty() {
                return Err(malformed(format!("missing type for parameter `{name}`")));
            }
            Ok(ParamToken { name: Some(name.to_string()), ty: ty.to_string() })
        }
        None => Ok(ParamToken { name: None, ty: piece.to_string() }),
    }
}

/// Position of the `)` that closes the `(` at the start of `text`.
fn closing_paren(text: &str) -> Result<usize> {
    let mut stack = Vec::new();
    for (i, c) in text.char_indices() {
        match c {
            '(' | '<' | '[' => {
                stack.push(c);
                if stack.len() > MAX_NESTING {
                    return Err(malformed(format!("nesting deeper than {MAX_NESTING}")));
                }
            }
            ')' | '>' | ']' => {
                close(&mut stack, c)?;
                if stack.is_empty() {
                    if c != ')' {
                        return Err(malformed("unbalanced brackets"));
                    }
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(malformed("missing `)`"))
}

fn close(stack: &mut Vec<char>, c: char) -> Result<()> {
    let expected = match stack.pop() {
        Some('(') => ')',
        Some('<') => '>',
        Some('[') => ']',
        _ => return Err(malformed("unbalanced brackets")),
    };
    if c != expected {
        return Err(malformed("unbalanced brackets"));
    }
    Ok(())
}

/// Splits on `sep` wherever no bracket is open.
fn split_top_level(text: &str, sep: char) -> Result<Vec<&str>> {
    let mut stack = Vec::new();
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '<' | '[' => {
                stack.push(c);
                if stack.len() > MAX_NESTING {
                    return Err(malformed(format!("nesting deeper than {MAX_NESTING}")));
                }
            }
            ')' | '>' | ']' => close(&mut stack, c)?,
            c if c == sep && stack.is_empty() => {
                pieces.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(malformed("unbalanced brackets"));
    }
    pieces.push(&text[start..]);
    Ok(pieces)
}

/// The `:` separating a parameter name from its type. `::` path separators do not count.
fn name_colon(piece: &str) -> Option<usize> {
    let bytes = piece.as_bytes();
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'<' | b'[' => depth += 1,
            b')' | b'>' | b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => {
                let prev = i > 0 && bytes[i - 1] == b':';
                let next = bytes.get(i + 1) == Some(&b':');
                if !prev && !next {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Maps one type token to its descriptor.
pub fn parse_type(token: &str) -> Result<TypeDescriptor> {
    parse_at(token, 0)
}

fn parse_at(token: &str, depth: usize) -> Result<TypeDescriptor> {
    if depth > MAX_NESTING {
        return Err(malformed(format!("nesting deeper than {MAX_NESTING}")));
    }
    let norm = normalize(token);
    if norm.is_empty() {
        return Err(malformed("empty type"));
    }
    if let Some(ty) = scalar(&norm) {
        return Ok(ty);
    }

    // `[T; N]`
    if let Some(inner) = norm.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let parts = split_top_level(inner, ';')?;
        if let [element, len] = parts.as_slice() {
            return Ok(TypeDescriptor::array(parse_at(element, depth + 1)?, array_len(len)?));
        }
        return Err(unsupported(token));
    }

    if let Some(open) = norm.find('<').filter(|_| norm.ends_with('>')) {
        let head = norm[..open].trim();
        let args = split_top_level(&norm[open + 1..norm.len() - 1], ',')?;
        let args: Vec<&str> = args.iter().map(|a| a.trim()).collect();

        if SEQUENCE_HEADS.contains(&head) {
            let element = match args.as_slice() {
                [element] => parse_at(element, depth + 1)?,
                [element, alloc] if alloc.starts_with("std::allocator<") => parse_at(element, depth + 1)?,
                _ => return Err(unsupported(token)),
            };
            // A count with no bytes behind it would let a caller size the allocation freely.
            if element.is_zero_sized() {
                return Err(unsupported(token));
            }
            return Ok(TypeDescriptor::sequence(element));
        }
        if ARRAY_HEADS.contains(&head) {
            return match args.as_slice() {
                [element, len] => Ok(TypeDescriptor::array(parse_at(element, depth + 1)?, array_len(len)?)),
                _ => Err(unsupported(token)),
            };
        }
        if STRING_HEADS.contains(&head) && args.first().map(|a| normalize(a)).as_deref() == Some("char") {
            return Ok(TypeDescriptor::String);
        }
    }

    Err(unsupported(token))
}

const SEQUENCE_HEADS: &[&str] = &[
    "sequence",
    "Vec",
    "std::vec::Vec",
    "alloc::vec::Vec",
    "vector",
    "std::vector",
    "std::__1::vector",
];

const ARRAY_HEADS: &[&str] = &["array", "std::array", "std::__1::array"];

const STRING_HEADS: &[&str] = &[
    "basic_string",
    "std::basic_string",
    "std::__cxx11::basic_string",
    "std::__1::basic_string",
];

fn scalar(norm: &str) -> Option<TypeDescriptor> {
    let ty = match norm {
        "i8" | "int8_t" | "signed char" | "char" => TypeDescriptor::I8,
        "u8" | "uint8_t" | "unsigned char" => TypeDescriptor::U8,
        "i16" | "int16_t" | "short" | "short int" | "signed short" => TypeDescriptor::I16,
        "u16" | "uint16_t" | "unsigned short" | "unsigned short int" => TypeDescriptor::U16,
        "i32" | "int32_t" | "int" | "signed" | "signed int" => TypeDescriptor::I32,
        "u32" | "uint32_t" | "unsigned" | "unsigned int" => TypeDescriptor::U32,
        "i64" | "int64_t" | "isize" | "ssize_t" | "ptrdiff_t" | "long" | "long int" | "long long"
        | "long long int" | "integer" => TypeDescriptor::I64,
        "u64" | "uint64_t" | "usize" | "size_t" | "unsigned long" | "unsigned long int"
        | "unsigned long long" | "unsigned long long int" => TypeDescriptor::U64,
        "f32" | "float" => TypeDescriptor::F32,
        "f64" | "double" => TypeDescriptor::F64,
        "bool" | "boolean" => TypeDescriptor::Bool,
        "string" | "String" | "str" | "char*" | "std::string" | "std::__cxx11::string"
        | "std::string::String" | "alloc::string::String" => TypeDescriptor::String,
        "void" | "()" => TypeDescriptor::Void,
        _ => return None,
    };
    Some(ty)
}

/// `4`, `4ul`, `4u`.
fn array_len(token: &str) -> Result<u64> {
    let digits = token.trim().trim_end_matches(['u', 'U', 'l', 'L']);
    digits
        .parse()
        .map_err(|_| malformed(format!("invalid array length `{}`", token.trim())))
}

/// Collapses whitespace and drops qualifiers that do not change the wire type:
/// `const`, C++ references, and Rust shared borrows with their lifetimes.
fn normalize(token: &str) -> String {
    let mut s = token.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(rest) = s.strip_prefix('&') {
        let mut rest = rest.trim_start();
        if rest.starts_with('\'') {
            rest = rest.split_once(' ').map_or("", |(_, tail)| tail);
        }
        rest = rest.strip_prefix("mut ").unwrap_or(rest);
        s = rest.to_string();
    }

    while let Some(rest) = s.strip_suffix('&') {
        s = rest.trim_end().to_string();
    }

    let s = s.replace("const*", "*");
    let s = s.split(' ').filter(|w| *w != "const").collect::<Vec<_>>().join(" ");
    s.replace(" *", "*")
}

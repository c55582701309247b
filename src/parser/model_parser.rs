//! nom-based parser for the model description text format
//!
//! Accepts exactly the model grammar:
//!
//! ```text
//! namespace <dotted.path> {
//!     primitive <Name>
//!     enum <Name>
//!     collection <Name> < <TypeParam>,* >
//!     datatype <Name> [: <TypeRef>,*] {
//!         ( reference-val | reference-var | composite-val | composite-var | dis ) <name> : <TypeRef>
//!     }
//! }
//! ```
//!
//! with `//` and `/* */` comments and insignificant whitespace. `*-val`
//! properties are auto-assigned identity indices in declaration order.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while},
    character::complete::{alpha1, alphanumeric1, char, multispace1},
    combinator::{map, not, opt, recognize, value},
    error::{convert_error, VerboseError},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    Finish, IResult,
};

use crate::error::{ParseIssue, TypewalkError};
use crate::model::declaration::{
    CollectionType, Datatype, EnumType, PrimitiveType, TypeDeclaration,
};
use crate::model::namespace::Namespace;
use crate::model::property::PropertyCharacteristic;
use crate::model::reference::TypeRef;
use crate::model::registry::TypeModel;

/// Parser error type with context information
pub type NomParseError<'a> = VerboseError<&'a str>;
pub type ParseResult<'a, T> = IResult<&'a str, T, NomParseError<'a>>;

/// A declaration as parsed, before it is attached to its namespace.
#[derive(Debug)]
enum ParsedDecl {
    Primitive(String),
    Enum(String),
    Collection {
        name: String,
        parameters: Vec<String>,
    },
    Datatype {
        name: String,
        super_types: Vec<TypeRef>,
        properties: Vec<(PropertyCharacteristic, String, TypeRef)>,
    },
}

type ParsedNamespace = (Vec<String>, Vec<ParsedDecl>);

/// Parse a complete model description into a fresh [`TypeModel`].
///
/// Syntax errors fail with [`TypewalkError::ConfigParse`]; issues that do
/// not prevent registration (duplicate declarations) are returned.
pub fn parse_model(text: &str) -> Result<(TypeModel, Vec<ParseIssue>), TypewalkError> {
    let mut model = TypeModel::new();
    let issues = model.register_from_str(text)?;
    Ok((model, issues))
}

/// Parse the namespaces of a model description without registering them.
pub(crate) fn parse_namespaces(
    text: &str,
) -> Result<(Vec<Namespace>, Vec<ParseIssue>), TypewalkError> {
    match model_internal(text).finish() {
        Ok((remaining, parsed)) => {
            if !remaining.trim().is_empty() {
                let (line, column) = position_of(text, remaining);
                return Err(TypewalkError::ConfigParse {
                    message: format!("unexpected input at {line}:{column}"),
                    issues: vec![ParseIssue::new(line, column, "unexpected input")],
                });
            }
            Ok(build_namespaces(parsed))
        }
        Err(e) => Err(syntax_error(text, e)),
    }
}

/// Parse a single type reference, e.g. `std.collections.List<String>?`.
pub(crate) fn parse_type_ref(text: &str) -> Result<TypeRef, TypewalkError> {
    match terminated(sp(type_reference), ws)(text).finish() {
        Ok((remaining, reference)) if remaining.is_empty() => Ok(reference),
        Ok((remaining, _)) => {
            let (line, column) = position_of(text, remaining);
            Err(TypewalkError::ConfigParse {
                message: format!("unexpected input in type reference at {line}:{column}"),
                issues: vec![ParseIssue::new(line, column, "unexpected input")],
            })
        }
        Err(e) => Err(syntax_error(text, e)),
    }
}

// model = namespace* ;
fn model_internal(input: &str) -> ParseResult<'_, Vec<ParsedNamespace>> {
    terminated(many0(sp(namespace_decl)), ws)(input)
}

// namespace = 'namespace' path '{' declaration* '}' ;
fn namespace_decl(input: &str) -> ParseResult<'_, ParsedNamespace> {
    map(
        tuple((
            keyword("namespace"),
            sp(dotted_path),
            sp(char('{')),
            many0(sp(declaration)),
            sp(char('}')),
        )),
        |(_, path, _, declarations, _)| (path, declarations),
    )(input)
}

// declaration = primitive | enum | collection | datatype ;
fn declaration(input: &str) -> ParseResult<'_, ParsedDecl> {
    alt((primitive_decl, enum_decl, collection_decl, datatype_decl))(input)
}

// primitive = 'primitive' NAME ;
fn primitive_decl(input: &str) -> ParseResult<'_, ParsedDecl> {
    map(preceded(keyword("primitive"), sp(identifier)), ParsedDecl::Primitive)(input)
}

// enum = 'enum' NAME ;
fn enum_decl(input: &str) -> ParseResult<'_, ParsedDecl> {
    map(preceded(keyword("enum"), sp(identifier)), ParsedDecl::Enum)(input)
}

// collection = 'collection' NAME '<' typeParameterList '>' ;
fn collection_decl(input: &str) -> ParseResult<'_, ParsedDecl> {
    map(
        tuple((
            keyword("collection"),
            sp(identifier),
            delimited(
                sp(char('<')),
                separated_list1(sp(char(',')), sp(identifier)),
                sp(char('>')),
            ),
        )),
        |(_, name, parameters)| ParsedDecl::Collection { name, parameters },
    )(input)
}

// datatype = 'datatype' NAME supertypes? '{' property* '}' ;
fn datatype_decl(input: &str) -> ParseResult<'_, ParsedDecl> {
    map(
        tuple((
            keyword("datatype"),
            sp(identifier),
            opt(supertypes),
            sp(char('{')),
            many0(sp(property_decl)),
            sp(char('}')),
        )),
        |(_, name, super_types, _, properties, _)| ParsedDecl::Datatype {
            name,
            super_types: super_types.unwrap_or_default(),
            properties,
        },
    )(input)
}

// supertypes = ':' [ typeReference / ',']+ ;
fn supertypes(input: &str) -> ParseResult<'_, Vec<TypeRef>> {
    preceded(
        sp(char(':')),
        separated_list1(sp(char(',')), sp(type_reference)),
    )(input)
}

// property = characteristic NAME ':' typeReference ;
fn property_decl(input: &str) -> ParseResult<'_, (PropertyCharacteristic, String, TypeRef)> {
    map(
        tuple((
            characteristic,
            sp(identifier),
            sp(char(':')),
            sp(type_reference),
        )),
        |(ch, name, _, reference)| (ch, name, reference),
    )(input)
}

fn characteristic(input: &str) -> ParseResult<'_, PropertyCharacteristic> {
    alt((
        value(PropertyCharacteristic::ReferenceVal, keyword("reference-val")),
        value(PropertyCharacteristic::ReferenceVar, keyword("reference-var")),
        value(PropertyCharacteristic::CompositeVal, keyword("composite-val")),
        value(PropertyCharacteristic::CompositeVar, keyword("composite-var")),
        value(PropertyCharacteristic::Disregard, keyword("dis")),
    ))(input)
}

// typeReference = path typeArgumentList? '?'? ;
fn type_reference(input: &str) -> ParseResult<'_, TypeRef> {
    let (input, path) = dotted_path(input)?;
    let (input, arguments) = opt(type_argument_list)(input)?;
    let (input, question) = opt(sp(char('?')))(input)?;
    let mut reference = TypeRef::new(path, arguments.unwrap_or_default());
    if question.is_some() {
        reference = reference.nullable();
    }
    Ok((input, reference))
}

// typeArgumentList = '<' [ typeReference / ',']+ '>' ;
fn type_argument_list(input: &str) -> ParseResult<'_, Vec<TypeRef>> {
    delimited(
        sp(char('<')),
        separated_list1(sp(char(',')), sp(type_reference)),
        sp(char('>')),
    )(input)
}

// path = [ NAME / '.']+ ;
fn dotted_path(input: &str) -> ParseResult<'_, Vec<String>> {
    separated_list1(sp(char('.')), sp(identifier))(input)
}

// NAME = "[a-zA-Z_][a-zA-Z0-9_]*" ;
fn identifier(input: &str) -> ParseResult<'_, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        str::to_string,
    )(input)
}

/// A keyword: the exact tag, not followed by an identifier character.
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> ParseResult<'a, &'a str> {
    terminated(tag(kw), not(alt((alphanumeric1, tag("_")))))
}

/// Skippable input: whitespace and `//` / `/* */` comments.
fn ws(input: &str) -> ParseResult<'_, &str> {
    recognize(many0(alt((multispace1, line_comment, block_comment))))(input)
}

fn sp<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> ParseResult<'a, O>
where
    F: FnMut(&'a str) -> ParseResult<'a, O>,
{
    preceded(ws, inner)
}

fn line_comment(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(tag("//"), take_while(|c| c != '\n' && c != '\r')))(input)
}

fn block_comment(input: &str) -> ParseResult<'_, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// Attach parsed declarations to their namespaces, collecting duplicate
/// issues (duplicates replace earlier declarations, position preserved).
fn build_namespaces(parsed: Vec<ParsedNamespace>) -> (Vec<Namespace>, Vec<ParseIssue>) {
    let mut namespaces = Vec::new();
    let mut issues = Vec::new();
    for (path, declarations) in parsed {
        let mut ns = Namespace::new(path);
        for decl in declarations {
            let declaration = match decl {
                ParsedDecl::Primitive(name) => {
                    TypeDeclaration::Primitive(PrimitiveType::new(ns.path().to_vec(), name))
                }
                ParsedDecl::Enum(name) => {
                    TypeDeclaration::Enum(EnumType::new(ns.path().to_vec(), name))
                }
                ParsedDecl::Collection { name, parameters } => TypeDeclaration::Collection(
                    CollectionType::new(ns.path().to_vec(), name, parameters),
                ),
                ParsedDecl::Datatype {
                    name,
                    super_types,
                    properties,
                } => {
                    let mut dt = Datatype::new(ns.path().to_vec(), name);
                    for reference in super_types {
                        dt.add_super_type(reference);
                    }
                    for (ch, prop_name, reference) in properties {
                        if dt.property(&prop_name).is_some() {
                            issues.push(ParseIssue::new(
                                0,
                                0,
                                format!(
                                    "duplicate property '{}' on datatype '{}'",
                                    prop_name,
                                    dt.qualified_name()
                                ),
                            ));
                        }
                        dt.declare_property(ch, prop_name, reference);
                    }
                    TypeDeclaration::Datatype(dt)
                }
            };
            let qualified = declaration.qualified_name();
            if ns.add_declaration(declaration).is_some() {
                issues.push(ParseIssue::new(
                    0,
                    0,
                    format!("duplicate declaration '{qualified}'"),
                ));
            }
        }
        namespaces.push(ns);
    }
    (namespaces, issues)
}

fn syntax_error(text: &str, error: NomParseError<'_>) -> TypewalkError {
    let message = convert_error(text, error.clone());
    let issues = error
        .errors
        .iter()
        .map(|(input, kind)| {
            let (line, column) = position_of(text, input);
            ParseIssue::new(line, column, format!("{kind:?}"))
        })
        .collect();
    TypewalkError::ConfigParse { message, issues }
}

/// 1-based line/column of a parser position (a suffix of `text`).
fn position_of(text: &str, remaining: &str) -> (usize, usize) {
    let offset = text.len().saturating_sub(remaining.len());
    let consumed = &text[..offset];
    let line = consumed.bytes().filter(|b| *b == b'\n').count() + 1;
    let column = consumed
        .rfind('\n')
        .map(|pos| offset - pos)
        .unwrap_or(offset + 1);
    (line, column)
}

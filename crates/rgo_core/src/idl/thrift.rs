use camino::{Utf8Path, Utf8PathBuf};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThriftFile {
    pub path: Utf8PathBuf,
    pub namespaces: Vec<Namespace>,
    pub services: Vec<Service>,
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub language: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub return_type: String,
    pub arguments: Vec<Field>,
    pub oneway: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub id: Option<i64>,
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    pub name: String,
    /// Values in source order.
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

impl ThriftFile {
    /// The `namespace go` declaration, lowercased.
    pub fn go_namespace(&self) -> Option<String> {
        self.namespaces
            .iter()
            .find(|n| n.language == "go")
            .map(|n| n.name.to_lowercase())
    }

    /// The service the generator works with. Extra `service` declarations
    /// are ignored.
    pub fn primary_service(&self) -> Option<&Service> {
        self.services.first()
    }
}

/// Parse a `.thrift` file from disk.
pub fn parse_file(path: &Utf8Path) -> Result<ThriftFile> {
    if path.extension() != Some("thrift") {
        return Err(Error::UnsupportedIdlExtension {
            path: path.to_owned(),
        });
    }
    let contents = fs_err::read_to_string(path).map_err(|e| Error::IdlParse {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    parse(&contents, path)
}

/// Parse Thrift source text.
pub fn parse(source: &str, path: &Utf8Path) -> Result<ThriftFile> {
    Parser::new(source, path).document()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Literal(String),
    Symbol(char),
}

struct Parser<'a> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    path: &'a Utf8Path,
}

impl<'a> Parser<'a> {
    fn new(source: &str, path: &'a Utf8Path) -> Self {
        Self {
            tokens: lex(source),
            pos: 0,
            path,
        }
    }

    fn document(mut self) -> Result<ThriftFile> {
        let mut file = ThriftFile {
            path: self.path.to_owned(),
            namespaces: vec![],
            services: vec![],
            structs: vec![],
            enums: vec![],
        };

        while let Some(token) = self.peek() {
            match token {
                Token::Ident(word) => match word.as_str() {
                    "namespace" => {
                        self.next();
                        let language = self.expect_ident("namespace language")?;
                        let name = self.qualified_name("namespace name")?;
                        file.namespaces.push(Namespace { language, name });
                    }
                    "include" | "cpp_include" => {
                        self.next();
                        // the included path literal
                        self.next();
                    }
                    "service" => {
                        self.next();
                        file.services.push(self.service()?);
                    }
                    "struct" | "union" | "exception" => {
                        self.next();
                        file.structs.push(self.strukt()?);
                    }
                    "enum" => {
                        self.next();
                        file.enums.push(self.enumeration()?);
                    }
                    "typedef" | "const" | "senum" => {
                        self.next();
                        self.skip_statement();
                    }
                    other => {
                        let other = other.to_string();
                        return Err(self.error(format!("unexpected top-level token `{other}`")));
                    }
                },
                _ => {
                    self.next();
                }
            }
        }

        Ok(file)
    }

    fn service(&mut self) -> Result<Service> {
        let name = self.expect_ident("service name")?;
        // `extends Base` is accepted and ignored.
        if self.peek_ident() == Some("extends") {
            self.next();
            self.qualified_name("service base name")?;
        }
        self.expect_symbol('{')?;

        let mut functions = vec![];
        loop {
            match self.peek() {
                Some(Token::Symbol('}')) => {
                    self.next();
                    break;
                }
                Some(_) => functions.push(self.function()?),
                None => return Err(self.error("unterminated service block".to_string())),
            }
        }
        Ok(Service { name, functions })
    }

    fn function(&mut self) -> Result<Function> {
        let mut oneway = false;
        if self.peek_ident() == Some("oneway") {
            oneway = true;
            self.next();
        }
        let return_type = self.type_name("function return type")?;
        let name = self.expect_ident("function name")?;
        self.expect_symbol('(')?;
        let arguments = self.fields_until(')')?;

        if self.peek_ident() == Some("throws") {
            self.next();
            self.expect_symbol('(')?;
            self.fields_until(')')?;
        }
        self.eat_separator();

        Ok(Function {
            name,
            return_type,
            arguments,
            oneway,
        })
    }

    fn strukt(&mut self) -> Result<Struct> {
        let name = self.expect_ident("struct name")?;
        self.expect_symbol('{')?;
        let fields = self.fields_until('}')?;
        Ok(Struct { name, fields })
    }

    fn enumeration(&mut self) -> Result<Enum> {
        let name = self.expect_ident("enum name")?;
        self.expect_symbol('{')?;

        let mut values = vec![];
        let mut next_implicit = 0;
        loop {
            match self.next() {
                Some(Token::Symbol('}')) => break,
                Some(Token::Ident(value_name)) => {
                    let value = if self.peek() == Some(&Token::Symbol('=')) {
                        self.next();
                        let literal = self.expect_ident("enum value")?;
                        literal.parse::<i64>().map_err(|e| {
                            self.error(format!("invalid enum value `{literal}`: {e}"))
                        })?
                    } else {
                        next_implicit
                    };
                    next_implicit = value + 1;
                    values.push(EnumValue {
                        name: value_name,
                        value,
                    });
                    self.eat_separator();
                }
                Some(other) => {
                    return Err(self.error(format!("unexpected token in enum: {other:?}")));
                }
                None => return Err(self.error("unterminated enum block".to_string())),
            }
        }
        Ok(Enum { name, values })
    }

    /// Parse `id: [requiredness] type name [= default]` fields up to the
    /// closing symbol.
    fn fields_until(&mut self, close: char) -> Result<Vec<Field>> {
        let mut fields = vec![];
        loop {
            if self.peek() == Some(&Token::Symbol(close)) {
                self.next();
                return Ok(fields);
            }
            if self.peek().is_none() {
                return Err(self.error(format!("expected `{close}`, found end of file")));
            }

            let id = if let Some(Token::Ident(word)) = self.peek() {
                if let Ok(id) = word.parse::<i64>() {
                    self.next();
                    self.expect_symbol(':')?;
                    Some(id)
                } else {
                    None
                }
            } else {
                None
            };

            if matches!(self.peek_ident(), Some("required" | "optional")) {
                self.next();
            }

            let ty = self.type_name("field type")?;
            let name = self.expect_ident("field name")?;

            if self.peek() == Some(&Token::Symbol('=')) {
                self.next();
                // default value: a literal or an identifier
                self.next();
            }
            self.eat_separator();

            fields.push(Field { id, name, ty });
        }
    }

    /// A type reference rendered back to its source form, e.g. `i32`,
    /// `common.User` or `map<string, list<User>>`.
    fn type_name(&mut self, what: &str) -> Result<String> {
        let base = self.qualified_name(what)?;
        if self.peek() != Some(&Token::Symbol('<')) {
            return Ok(base);
        }
        self.next();
        let mut params = vec![self.type_name(what)?];
        while self.peek() == Some(&Token::Symbol(',')) {
            self.next();
            params.push(self.type_name(what)?);
        }
        self.expect_symbol('>')?;
        Ok(format!("{base}<{}>", params.join(", ")))
    }

    /// A dotted identifier like `common.User`.
    fn qualified_name(&mut self, what: &str) -> Result<String> {
        let mut name = self.expect_ident(what)?;
        while self.peek() == Some(&Token::Symbol('.')) {
            self.next();
            name.push('.');
            name.push_str(&self.expect_ident(what)?);
        }
        Ok(name)
    }

    /// Skip a statement we don't model, up to the next `;` or end of line
    /// construct. Brace blocks are skipped with nesting.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token {
                Token::Symbol('{') => depth += 1,
                Token::Symbol('}') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.next();
                        return;
                    }
                }
                Token::Symbol(';') if depth == 0 => {
                    self.next();
                    return;
                }
                Token::Ident(word)
                    if depth == 0
                        && matches!(
                            word.as_str(),
                            "namespace"
                                | "include"
                                | "service"
                                | "struct"
                                | "union"
                                | "exception"
                                | "enum"
                                | "typedef"
                                | "const"
                        ) =>
                {
                    return;
                }
                _ => {}
            }
            self.next();
        }
    }

    fn eat_separator(&mut self) {
        while matches!(self.peek(), Some(Token::Symbol(',' | ';'))) {
            self.next();
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek() {
            Some(Token::Ident(word)) => Some(word.as_str()),
            _ => None,
        }
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_ident(&mut self, what: &str) -> Result<String> {
        match self.next() {
            Some(Token::Ident(word)) => Ok(word),
            other => Err(self.error(format!("expected {what}, found {other:?}"))),
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<()> {
        match self.next() {
            Some(Token::Symbol(c)) if c == symbol => Ok(()),
            other => Err(self.error(format!("expected `{symbol}`, found {other:?}"))),
        }
    }

    fn error(&self, message: String) -> Error {
        let line = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, line)| *line)
            .unwrap_or(0);
        Error::IdlParse {
            path: self.path.to_owned(),
            message: format!("line {line}: {message}"),
        }
    }
}

fn lex(source: &str) -> Vec<(Token, usize)> {
    let mut tokens = vec![];
    let mut chars = source.char_indices().peekable();
    let mut line = 1;

    while let Some((_, c)) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '#' => {
                skip_line(&mut chars);
                line += 1;
            }
            '/' => match chars.peek() {
                Some((_, '/')) => {
                    chars.next();
                    skip_line(&mut chars);
                    line += 1;
                }
                Some((_, '*')) => {
                    chars.next();
                    let mut prev = ' ';
                    for (_, c) in chars.by_ref() {
                        if c == '\n' {
                            line += 1;
                        }
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                }
                _ => tokens.push((Token::Symbol('/'), line)),
            },
            '"' | '\'' => {
                let quote = c;
                let mut literal = String::new();
                for (_, c) in chars.by_ref() {
                    if c == quote {
                        break;
                    }
                    if c == '\n' {
                        line += 1;
                    }
                    literal.push(c);
                }
                tokens.push((Token::Literal(literal), line));
            }
            c if is_ident_char(c) => {
                let mut word = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if is_ident_char(next) {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(word), line));
            }
            other => tokens.push((Token::Symbol(other), line)),
        }
    }
    tokens
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) {
    for (_, c) in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '+'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EXAMPLE: &str = r#"
namespace go example.user
namespace java com.example.user

include "common.thrift"

// A user record.
struct User {
    1: required string name
    2: optional i64 id
}

struct QueryUserRequest {
    1: string query
}

struct QueryUserResponse {
    1: list<User> users
}

enum Status {
    ACTIVE
    DISABLED = 5
    BANNED
}

service UserService {
    QueryUserResponse queryUser(1: QueryUserRequest req)
    oneway void ping(1: QueryUserRequest req)
}
"#;

    fn parse_example() -> ThriftFile {
        parse(EXAMPLE, Utf8Path::new("example.thrift")).unwrap()
    }

    #[test]
    fn go_namespace_is_lowercased() {
        let file = parse_example();
        assert_eq!(file.go_namespace().unwrap(), "example.user");
        assert_eq!(file.namespaces.len(), 2);
    }

    #[test]
    fn service_functions_are_parsed() {
        let file = parse_example();
        let service = file.primary_service().unwrap();
        assert_eq!(service.name, "UserService");
        assert_eq!(service.functions.len(), 2);

        let query = &service.functions[0];
        assert_eq!(query.name, "queryUser");
        assert_eq!(query.return_type, "QueryUserResponse");
        assert_eq!(query.arguments.len(), 1);
        assert_eq!(query.arguments[0].name, "req");
        assert_eq!(query.arguments[0].ty, "QueryUserRequest");
        assert_eq!(query.arguments[0].id, Some(1));

        assert!(service.functions[1].oneway);
    }

    #[test]
    fn enum_values_keep_source_order() {
        let file = parse_example();
        let status = &file.enums[0];
        let names: Vec<&str> = status.values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["ACTIVE", "DISABLED", "BANNED"]);
        let values: Vec<i64> = status.values.iter().map(|v| v.value).collect();
        assert_eq!(values, [0, 5, 6]);
    }

    #[test]
    fn container_types_round_trip() {
        let file = parse(
            "struct S { 1: map<string, list<i32>> index }",
            Utf8Path::new("c.thrift"),
        )
        .unwrap();
        assert_eq!(file.structs[0].fields[0].ty, "map<string, list<i32>>");
    }

    #[test]
    fn first_service_wins() {
        let file = parse(
            "service A { void a() }\nservice B { void b() }",
            Utf8Path::new("two.thrift"),
        )
        .unwrap();
        assert_eq!(file.primary_service().unwrap().name, "A");
    }

    #[test]
    fn missing_go_namespace_is_detectable() {
        let file = parse("namespace java only.java", Utf8Path::new("x.thrift")).unwrap();
        assert_eq!(file.go_namespace(), None);
    }

    #[test]
    fn non_thrift_extension_is_rejected() {
        let err = parse_file(Utf8Path::new("service.proto")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedIdlExtension { .. }));
    }

    #[test]
    fn garbage_reports_parse_error_with_line() {
        let err = parse("struct {", Utf8Path::new("bad.thrift")).unwrap_err();
        let Error::IdlParse { message, .. } = err else {
            panic!("expected parse error");
        };
        assert!(message.contains("line 1"));
    }
}

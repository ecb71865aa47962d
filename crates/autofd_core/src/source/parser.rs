//! Tokenizer and recursive-descent parser for `.sfn` files.

use super::ast::{BinOp, Expr, FnDecl, Item, SourceFile, Stmt};
use crate::types::ScalarType;

/// Parses a whole source file.
pub fn parse_source(input: &str) -> Result<SourceFile, String> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    parser.parse_file()
}

/// Parses a single expression, e.g. from a command line.
pub fn parse_expression(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.error(&format!("unexpected {token:?} after expression"))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Colon,
    PathSep,
    Dot,
    Arrow,
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Not,
    AndAnd,
    OrOr,
    Amp,
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        if c == '\n' {
            line += 1;
            chars.next();
        } else if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() {
            let mut num_str = String::new();
            while let Some(&d) = chars.peek() {
                let exponent_sign = (d == '+' || d == '-') && num_str.ends_with(['e', 'E']);
                let numeric = d.is_ascii_digit() || matches!(d, '.' | '_' | 'e' | 'E');
                if numeric || exponent_sign {
                    if d != '_' {
                        num_str.push(d);
                    }
                    chars.next();
                } else {
                    break;
                }
            }
            let value: f64 = num_str
                .parse()
                .map_err(|_| format!("line {line}: invalid number literal {num_str:?}"))?;
            if !value.is_finite() {
                return Err(format!("line {line}: number literal out of range"));
            }
            tokens.push((Token::Number(value), line));
        } else if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push((Token::Identifier(ident), line));
        } else {
            chars.next();
            let next = chars.peek().copied();
            let (token, wide) = match (c, next) {
                ('/', Some('/')) => {
                    while let Some(&d) = chars.peek() {
                        if d == '\n' {
                            break;
                        }
                        chars.next();
                    }
                    continue;
                }
                (':', Some(':')) => (Token::PathSep, true),
                ('-', Some('>')) => (Token::Arrow, true),
                ('=', Some('=')) => (Token::Eq, true),
                ('!', Some('=')) => (Token::Ne, true),
                ('<', Some('=')) => (Token::Le, true),
                ('>', Some('=')) => (Token::Ge, true),
                ('&', Some('&')) => (Token::AndAnd, true),
                ('|', Some('|')) => (Token::OrOr, true),
                ('+', _) => (Token::Plus, false),
                ('-', _) => (Token::Minus, false),
                ('*', _) => (Token::Star, false),
                ('/', _) => (Token::Slash, false),
                ('%', _) => (Token::Percent, false),
                ('(', _) => (Token::LParen, false),
                (')', _) => (Token::RParen, false),
                ('{', _) => (Token::LBrace, false),
                ('}', _) => (Token::RBrace, false),
                (',', _) => (Token::Comma, false),
                (';', _) => (Token::Semicolon, false),
                (':', _) => (Token::Colon, false),
                ('.', _) => (Token::Dot, false),
                ('=', _) => (Token::Assign, false),
                ('<', _) => (Token::Lt, false),
                ('>', _) => (Token::Gt, false),
                ('!', _) => (Token::Not, false),
                ('&', _) => (Token::Amp, false),
                _ => return Err(format!("line {line}: unexpected character {c:?}")),
            };
            if wide {
                chars.next();
            }
            tokens.push((token, line));
        }
    }
    Ok(tokens)
}

fn scalar_type(name: &str) -> ScalarType {
    match name {
        "f64" => ScalarType::F64,
        "f32" => ScalarType::F32,
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "isize" | "usize" => {
            ScalarType::Int
        }
        other => ScalarType::Named(other.to_string()),
    }
}

/// Limit on nested expressions, blocks and operator chains.
const MAX_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| t.clone())
    }

    fn peek_is(&self, expected: &Token) -> bool {
        matches!(self.tokens.get(self.pos), Some((t, _)) if t == expected)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.tokens.get(self.pos), Some((Token::Identifier(id), _)) if id == keyword)
    }

    fn consume(&mut self) -> Option<Token> {
        if self.pos < self.tokens.len() {
            let t = self.tokens[self.pos].0.clone();
            self.pos += 1;
            Some(t)
        } else {
            None
        }
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |(_, line)| *line)
    }

    fn error(&self, message: &str) -> String {
        format!("line {}: {}", self.line(), message)
    }

    /// Enters one nesting level; callers leave it with `self.depth -= 1`.
    fn deepen(&mut self, what: &str) -> Result<(), String> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(&format!("{what} nested too deeply")));
        }
        self.depth += 1;
        Ok(())
    }

    fn nested<T>(
        &mut self,
        what: &str,
        parse: impl FnOnce(&mut Self) -> Result<T, String>,
    ) -> Result<T, String> {
        self.deepen(what)?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), String> {
        if self.peek_is(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, String> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(&format!("expected {what}"))),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek_is(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // --- Items ---

    fn parse_file(&mut self) -> Result<SourceFile, String> {
        let mut items = Vec::new();
        while self.peek().is_some() {
            items.push(self.parse_item()?);
        }
        Ok(SourceFile { items })
    }

    fn parse_item(&mut self) -> Result<Item, String> {
        self.eat_keyword("pub");
        if self.eat_keyword("fn") {
            return Ok(Item::Fn(self.parse_fn()?));
        }
        if self.eat_keyword("struct") {
            let name = self.expect_identifier("struct name")?;
            if self.eat(&Token::LBrace) {
                self.skip_balanced_braces()?;
            } else {
                self.expect(Token::Semicolon, "';' after struct")?;
            }
            return Ok(Item::Struct { name });
        }
        if self.eat_keyword("impl") {
            let ty = self.expect_identifier("type name after impl")?;
            self.expect(Token::LBrace, "'{' after impl type")?;
            let mut methods = Vec::new();
            while !self.eat(&Token::RBrace) {
                self.eat_keyword("pub");
                if !self.eat_keyword("fn") {
                    return Err(self.error("expected fn inside impl block"));
                }
                methods.push(self.parse_fn()?);
            }
            return Ok(Item::Impl { ty, methods });
        }
        if self.eat_keyword("const") {
            let name = self.expect_identifier("constant name")?;
            self.expect(Token::Colon, "':' after constant name")?;
            let ty = self.parse_type()?;
            self.expect(Token::Assign, "'=' in constant")?;
            let value = self.parse_expression()?;
            self.expect(Token::Semicolon, "';' after constant")?;
            return Ok(Item::Const { name, ty, value });
        }
        Err(self.error("expected fn, struct, impl or const"))
    }

    /// Struct fields are not needed; skip to the matching '}'.
    fn skip_balanced_braces(&mut self) -> Result<(), String> {
        let mut depth = 1;
        while depth > 0 {
            match self.consume() {
                Some(Token::LBrace) => depth += 1,
                Some(Token::RBrace) => depth -= 1,
                Some(_) => {}
                None => return Err(self.error("unclosed '{'")),
            }
        }
        Ok(())
    }

    fn parse_fn(&mut self) -> Result<FnDecl, String> {
        let name = self.expect_identifier("function name")?;
        self.expect(Token::LParen, "'(' after function name")?;

        let mut receiver = false;
        let mut params = Vec::new();
        while !self.eat(&Token::RParen) {
            if !params.is_empty() || receiver {
                self.expect(Token::Comma, "',' between parameters")?;
                if self.eat(&Token::RParen) {
                    break;
                }
            }
            if self.parse_receiver() {
                if receiver || !params.is_empty() {
                    return Err(self.error("self must be the first parameter"));
                }
                receiver = true;
                continue;
            }
            let param = self.expect_identifier("parameter name")?;
            self.expect(Token::Colon, "':' after parameter name")?;
            let ty = self.parse_type()?;
            params.push((param, ty));
        }

        let results = if self.eat(&Token::Arrow) {
            self.parse_result_types()?
        } else {
            Vec::new()
        };

        let body = self.parse_block()?;
        Ok(FnDecl {
            name,
            receiver,
            params,
            results,
            body,
        })
    }

    /// `self`, `&self` or `&mut self`.
    fn parse_receiver(&mut self) -> bool {
        let start = self.pos;
        if self.eat(&Token::Amp) {
            self.eat_keyword("mut");
        }
        if self.eat_keyword("self") {
            return true;
        }
        self.pos = start;
        false
    }

    fn parse_type(&mut self) -> Result<ScalarType, String> {
        if self.eat(&Token::LParen) {
            let inner = self.parse_type_list()?;
            let names: Vec<String> = inner.iter().map(ToString::to_string).collect();
            return Ok(ScalarType::Named(format!("({})", names.join(", "))));
        }
        let name = self.expect_identifier("type")?;
        Ok(scalar_type(&name))
    }

    /// After '(' has been consumed.
    fn parse_type_list(&mut self) -> Result<Vec<ScalarType>, String> {
        let mut types = Vec::new();
        while !self.eat(&Token::RParen) {
            if !types.is_empty() {
                self.expect(Token::Comma, "',' between types")?;
                if self.eat(&Token::RParen) {
                    break;
                }
            }
            types.push(self.parse_type()?);
        }
        Ok(types)
    }

    /// `-> T` yields one result, `-> (T, U)` one per element, `-> ()` none.
    fn parse_result_types(&mut self) -> Result<Vec<ScalarType>, String> {
        if self.eat(&Token::LParen) {
            self.parse_type_list()
        } else {
            Ok(vec![self.parse_type()?])
        }
    }

    // --- Statements ---

    fn parse_block(&mut self) -> Result<Vec<Stmt>, String> {
        self.nested("block", Self::parse_block_inner)
    }

    fn parse_block_inner(&mut self) -> Result<Vec<Stmt>, String> {
        self.expect(Token::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.eat(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.error("unclosed block"));
            }
            if self.eat(&Token::Semicolon) {
                continue;
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> Result<Stmt, String> {
        if self.eat_keyword("return") {
            if self.eat(&Token::Semicolon) || self.peek_is(&Token::RBrace) {
                return Ok(Stmt::Return(None));
            }
            let value = self.parse_expression()?;
            self.end_statement()?;
            return Ok(Stmt::Return(Some(value)));
        }
        if self.eat_keyword("let") {
            self.eat_keyword("mut");
            let name = self.expect_identifier("binding name")?;
            if self.eat(&Token::Colon) {
                self.parse_type()?;
            }
            let value = if self.eat(&Token::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.end_statement()?;
            return Ok(Stmt::Let { name, value });
        }
        if self.eat_keyword("if") {
            return self.parse_if();
        }
        if self.eat_keyword("while") {
            let cond = self.parse_expression()?;
            let body = self.parse_block()?;
            return Ok(Stmt::While { cond, body });
        }
        if self.peek_is(&Token::LBrace) {
            return Ok(Stmt::Block(self.parse_block()?));
        }

        let expr = self.parse_expression()?;
        if self.eat(&Token::Assign) {
            let target = match expr {
                Expr::Ident(name) => name,
                other => return Err(self.error(&format!("cannot assign to {other}"))),
            };
            let value = self.parse_expression()?;
            self.end_statement()?;
            return Ok(Stmt::Assign { target, value });
        }
        self.end_statement()?;
        Ok(Stmt::Expr(expr))
    }

    /// After `if` has been consumed.
    fn parse_if(&mut self) -> Result<Stmt, String> {
        self.nested("block", Self::parse_if_inner)
    }

    fn parse_if_inner(&mut self) -> Result<Stmt, String> {
        let cond = self.parse_expression()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.eat_keyword("else") {
            if self.eat_keyword("if") {
                vec![self.parse_if()?]
            } else {
                self.parse_block()?
            }
        } else {
            Vec::new()
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    /// A statement ends with ';' or right before the closing '}'.
    fn end_statement(&mut self) -> Result<(), String> {
        if self.eat(&Token::Semicolon) || self.peek_is(&Token::RBrace) {
            Ok(())
        } else {
            Err(self.error("expected ';'"))
        }
    }

    // --- Expressions ---

    fn parse_expression(&mut self) -> Result<Expr, String> {
        self.nested("expression", Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        let mut levels = 0;
        while self.eat(&Token::OrOr) {
            self.deepen("expression")?;
            levels += 1;
            let right = self.parse_and()?;
            left = Expr::Binary(Box::new(left), BinOp::Or, Box::new(right));
        }
        self.depth -= levels;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_comparison()?;
        let mut levels = 0;
        while self.eat(&Token::AndAnd) {
            self.deepen("expression")?;
            levels += 1;
            let right = self.parse_comparison()?;
            left = Expr::Binary(Box::new(left), BinOp::And, Box::new(right));
        }
        self.depth -= levels;
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, String> {
        let left = self.parse_term()?;
        let op = match self.peek() {
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            _ => return Ok(left),
        };
        self.consume();
        let right = self.parse_term()?;
        Ok(Expr::Binary(Box::new(left), op, Box::new(right)))
    }

    fn parse_term(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_factor()?;
        let mut levels = 0;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.consume();
            self.deepen("expression")?;
            levels += 1;
            let right = self.parse_factor()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        self.depth -= levels;
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary()?;
        let mut levels = 0;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.consume();
            self.deepen("expression")?;
            levels += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        self.depth -= levels;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        let op = match self.peek() {
            Some(Token::Minus) => '-',
            Some(Token::Plus) => '+',
            Some(Token::Not) => '!',
            _ => return self.parse_postfix(),
        };
        self.consume();
        let expr = self.nested("expression", Self::parse_unary)?;
        Ok(Expr::Unary(op, Box::new(expr)))
    }

    fn parse_postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary()?;
        let mut levels = 0;
        loop {
            if self.peek_is(&Token::LParen) || self.peek_is(&Token::Dot) {
                self.deepen("expression")?;
                levels += 1;
            }
            if self.eat(&Token::LParen) {
                let args = self.parse_args()?;
                expr = Expr::Call(Box::new(expr), args);
            } else if self.eat(&Token::Dot) {
                let member = match self.consume() {
                    Some(Token::Identifier(name)) => name,
                    Some(Token::Number(n)) if n.fract() == 0.0 => format!("{n}"),
                    _ => return Err(self.error("expected field or method name after '.'")),
                };
                if self.eat(&Token::LParen) {
                    let args = self.parse_args()?;
                    expr = Expr::MethodCall(Box::new(expr), member, args);
                } else {
                    expr = Expr::Field(Box::new(expr), member);
                }
            } else {
                self.depth -= levels;
                return Ok(expr);
            }
        }
    }

    /// After '(' has been consumed.
    fn parse_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        while !self.eat(&Token::RParen) {
            if !args.is_empty() {
                self.expect(Token::Comma, "',' between arguments")?;
                if self.eat(&Token::RParen) {
                    break;
                }
            }
            args.push(self.parse_expression()?);
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        let token = match self.peek() {
            Some(token @ (Token::Number(_) | Token::Identifier(_) | Token::LParen)) => token,
            Some(other) => return Err(self.error(&format!("unexpected {other:?}"))),
            None => return Err(self.error("unexpected end of input")),
        };
        self.pos += 1;
        match token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Identifier(name) => {
                let mut segments = vec![name];
                while self.eat(&Token::PathSep) {
                    segments.push(self.expect_identifier("path segment after '::'")?);
                }
                if segments.len() == 1 {
                    Ok(Expr::Ident(segments.remove(0)))
                } else {
                    Ok(Expr::Path(segments))
                }
            }
            _ => {
                let first = self.parse_expression()?;
                if self.eat(&Token::RParen) {
                    return Ok(Expr::Paren(Box::new(first)));
                }
                let mut items = vec![first];
                while self.eat(&Token::Comma) {
                    if self.peek_is(&Token::RParen) {
                        break;
                    }
                    items.push(self.parse_expression()?);
                }
                self.expect(Token::RParen, "')'")?;
                Ok(Expr::Tuple(items))
            }
        }
    }
}

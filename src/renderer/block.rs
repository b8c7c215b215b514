//! Matches block open/close markers and builds the node tree the renderer
//! walks.

use crate::config::RenderOptions;
use crate::constants::blocks::{EACH, IF, UNLESS, WITH};
use crate::error::{Error, Result};
use crate::parser::{
    apply_whitespace_control, scan, Argument, Expression, ExpressionParser, HelperCall,
};
use log::debug;

/// A compiled template element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<'t> {
    Text(&'t str),
    Variable { path: String, offset: usize },
    Call(HelperCall),
    Block(Block<'t>),
    Partial { name: String, context: Option<Argument>, offset: usize },
}

/// A matched `{{#name}} ... {{/name}}` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<'t> {
    pub name: String,
    pub args: Vec<Argument>,
    pub inverted: bool,
    /// Segment before `{{else}}`.
    pub body: Vec<Node<'t>>,
    /// Segment after `{{else}}`; empty when there is none.
    pub inverse: Vec<Node<'t>>,
    /// Offset of the opening tag.
    pub offset: usize,
}

impl<'t> Block<'t> {
    /// The subject expression (`items` in `{{#each items}}`).
    pub fn subject(&self) -> &Argument {
        &self.args[0]
    }

    /// Segments in render order: the inverted form swaps them.
    pub fn segments(&self) -> (&[Node<'t>], &[Node<'t>]) {
        if self.inverted {
            (&self.inverse, &self.body)
        } else {
            (&self.body, &self.inverse)
        }
    }
}

/// Where the processor currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState<'s> {
    OutsideBlock,
    InsideBlock { name: &'s str, depth: usize },
}

#[derive(Debug)]
struct Frame<'t> {
    name: String,
    args: Vec<Argument>,
    inverted: bool,
    offset: usize,
    body: Vec<Node<'t>>,
    inverse: Option<Vec<Node<'t>>>,
}

/// Stack machine pairing block markers.
///
/// Nodes pushed while a block is open land in that block's current segment;
/// closing the block turns the frame into a [`Node::Block`] in the enclosing
/// segment. At most `max_depth` blocks may be open at once.
#[derive(Debug)]
pub struct BlockProcessor<'t> {
    root: Vec<Node<'t>>,
    frames: Vec<Frame<'t>>,
    max_depth: usize,
}

impl<'t> BlockProcessor<'t> {
    pub fn new(max_depth: usize) -> Self {
        Self { root: Vec::new(), frames: Vec::new(), max_depth }
    }

    pub fn state(&self) -> BlockState<'_> {
        match self.frames.last() {
            None => BlockState::OutsideBlock,
            Some(frame) => BlockState::InsideBlock { name: &frame.name, depth: self.frames.len() },
        }
    }

    pub fn push(&mut self, node: Node<'t>) {
        match self.frames.last_mut() {
            None => self.root.push(node),
            Some(frame) => match &mut frame.inverse {
                Some(inverse) => inverse.push(node),
                None => frame.body.push(node),
            },
        }
    }

    pub fn open(
        &mut self,
        name: String,
        args: Vec<Argument>,
        inverted: bool,
        offset: usize,
    ) -> Result<()> {
        if ![IF, UNLESS, EACH, WITH].contains(&name.as_str()) {
            return Err(Error::UnknownHelper { name });
        }
        if args.len() != 1 {
            return Err(Error::parse(
                offset,
                format!("#{name} expects exactly one argument, got {}", args.len()),
            ));
        }
        if self.frames.len() >= self.max_depth {
            return Err(Error::parse(
                offset,
                format!("blocks nested deeper than {}", self.max_depth),
            ));
        }
        self.frames.push(Frame { name, args, inverted, offset, body: Vec::new(), inverse: None });
        Ok(())
    }

    pub fn else_marker(&mut self, offset: usize) -> Result<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(Error::parse(offset, "{{else}} outside of a block"));
        };
        if frame.inverse.is_some() {
            return Err(Error::parse(offset, format!("duplicate {{{{else}}}} in #{}", frame.name)));
        }
        frame.inverse = Some(Vec::new());
        Ok(())
    }

    pub fn close(&mut self, name: &str, offset: usize) -> Result<()> {
        let Some(frame) = self.frames.pop() else {
            return Err(Error::parse(offset, format!("unexpected {{{{/{name}}}}} with no open block")));
        };
        if frame.name != name {
            return Err(Error::parse(
                offset,
                format!("block mismatch: expected {{{{/{}}}}}, found {{{{/{name}}}}}", frame.name),
            ));
        }
        self.push(Node::Block(Block {
            name: frame.name,
            args: frame.args,
            inverted: frame.inverted,
            body: frame.body,
            inverse: frame.inverse.unwrap_or_default(),
            offset: frame.offset,
        }));
        Ok(())
    }

    /// Ends input. Any block still open is unterminated.
    pub fn finish(self) -> Result<Vec<Node<'t>>> {
        if let Some(frame) = self.frames.last() {
            return Err(Error::parse(
                frame.offset,
                format!("unterminated block #{}", frame.name),
            ));
        }
        Ok(self.root)
    }
}

/// Tokenizes and parses `template` into a node tree.
pub fn compile<'t>(
    template: &'t str,
    parser: &ExpressionParser<'_>,
    options: &RenderOptions,
) -> Result<Vec<Node<'t>>> {
    let mut tokens = scan(template)?;
    apply_whitespace_control(&mut tokens, options.trim_standalone);

    let mut blocks = BlockProcessor::new(options.max_block_depth);
    for token in &tokens {
        if token.is_literal() {
            if !token.text.is_empty() {
                blocks.push(Node::Text(token.text));
            }
            continue;
        }
        let offset = token.offset;
        match parser.parse(token.content(), token.content_offset())? {
            Expression::Comment => {}
            Expression::Variable(path) => blocks.push(Node::Variable { path, offset }),
            Expression::HelperCall(call) => blocks.push(Node::Call(call)),
            Expression::BlockOpen { name, args, inverted } => {
                blocks.open(name, args, inverted, offset)?
            }
            Expression::Else => blocks.else_marker(offset)?,
            Expression::BlockClose(name) => blocks.close(&name, offset)?,
            Expression::Partial { name, context } => {
                blocks.push(Node::Partial { name, context, offset })
            }
        }
    }

    let nodes = blocks.finish()?;
    debug!("Compiled {} token(s) into {} top-level node(s)", tokens.len(), nodes.len());
    Ok(nodes)
}

/// Parsed boolean expression tree.
///
/// Straight out of the parser the leaves hold raw surface tokens; after the
/// analysis pass (`QueryParser::parse`) terms and phrase slots are normalized
/// and stemmed, and wildcard leaves are normalized but deliberately left
/// un-stemmed for the compatibility matcher.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// No-op leaf: a token that normalized away (or an empty query line).
    Empty,
    Term(String),
    /// Ordered token slots; strict adjacency at evaluation time.
    Phrase(Vec<String>),
    /// Token containing one or more `*`.
    Wildcard(String),
    And(Vec<QueryNode>),
    Or(Vec<QueryNode>),
    Not(Box<QueryNode>),
}

impl QueryNode {
    pub fn is_empty(&self) -> bool {
        matches!(self, QueryNode::Empty)
    }

    /// Rewrite leaves bottom-up; used by the correction loop.
    pub fn map_leaves(self, f: &mut impl FnMut(QueryNode) -> QueryNode) -> QueryNode {
        match self {
            QueryNode::And(children) => {
                QueryNode::And(children.into_iter().map(|c| c.map_leaves(f)).collect())
            }
            QueryNode::Or(children) => {
                QueryNode::Or(children.into_iter().map(|c| c.map_leaves(f)).collect())
            }
            QueryNode::Not(child) => QueryNode::Not(Box::new(child.map_leaves(f))),
            QueryNode::Empty => QueryNode::Empty,
            leaf => f(leaf),
        }
    }
}

/// Whole-line prefix flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryFlags {
    /// `-s[k]`: spelling correction up to edit distance k (0 = config default).
    pub spelling: Option<u32>,
    /// `-p[k]`: phonetic correction, at most k attempts (0 = config default).
    pub phonetic: Option<u32>,
    /// `-a`: one round of word-wise correction when the first pass is empty.
    pub auto_correct: bool,
    /// `-q`: quit the REPL.
    pub quit: bool,
}

impl QueryFlags {
    pub fn wants_correction(&self) -> bool {
        self.spelling.is_some() || self.phonetic.is_some() || self.auto_correct
    }
}

/// A query line after parsing and analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub flags: QueryFlags,
    pub root: QueryNode,
}

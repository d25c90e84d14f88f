use crate::symbols::Symbol;
use crate::types::{BlockType, ValueType};

use super::Param;

/// Type-level declarations surviving into the lifted IR.
#[derive(Debug, Clone)]
pub enum Declaration {
    Data(Data),
    Interface(Interface),
}

/// A data type. Exactly one constructor makes it a record: the back end
/// emits one accessor per field.
#[derive(Debug, Clone)]
pub struct Data {
    pub id: Symbol,
    pub tparams: Vec<Symbol>,
    pub ctors: Vec<Constructor>,
}

#[derive(Debug, Clone)]
pub struct Constructor {
    pub id: Symbol,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub id: Symbol,
    pub tpe: ValueType,
}

/// An effect interface. Operations are dispatched positionally in the
/// lifted IR, which is what allows the back end to share object encodings
/// between interfaces of the same arity.
#[derive(Debug, Clone)]
pub struct Interface {
    pub id: Symbol,
    pub tparams: Vec<Symbol>,
    pub ops: Vec<Property>,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub id: Symbol,
    pub tpe: BlockType,
}

/// An extern definition; the body is verbatim target code.
#[derive(Debug, Clone)]
pub struct Extern {
    pub id: Symbol,
    pub params: Vec<Param>,
    pub body: String,
}

//! Dynamic values exchanged by member bodies, constructors and event handlers
//!
//! Primitives compare by value. Lists, records, functions, instances, classes
//! and event channels are reference kinds and compare by identity, so two
//! independently built `{}` records are never equal.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::class::Class;
use crate::error::JooplResult;
use crate::event::EventChannel;
use crate::instance::Instance;

/// Shared, mutable list
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Shared, mutable record (string-keyed bag of values)
pub type RecordRef = Rc<RefCell<FxHashMap<String, Value>>>;

/// Signature of a native callable: `(this, args) -> result`
pub type NativeFn = dyn Fn(&Value, &[Value]) -> JooplResult<Value>;

/// Dynamic value
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// Immutable string
    Str(Rc<str>),
    /// Shared list
    List(ListRef),
    /// Shared record
    Record(RecordRef),
    /// Callable
    Function(Function),
    /// Class instance
    Object(Instance),
    /// Class (type descriptor)
    Class(Class),
    /// Event channel of an instance
    Event(EventChannel),
}

impl Value {
    /// Create a string value
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Create a new list value
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// Create a new record value
    pub fn record<'a>(entries: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<FxHashMap<_, _>>();
        Value::Record(Rc::new(RefCell::new(map)))
    }

    /// Create an empty record, the usual `{}` context object
    pub fn empty_record() -> Self {
        Value::Record(Rc::new(RefCell::new(FxHashMap::default())))
    }

    /// Create an empty list
    pub fn empty_list() -> Self {
        Value::List(Rc::new(RefCell::new(Vec::new())))
    }

    /// Create a function value
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> JooplResult<Value> + 'static,
    {
        Value::Function(Function::new(f))
    }

    /// Check for `Undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// Get as list
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get as record
    pub fn as_record(&self) -> Option<&RecordRef> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Get as function
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Get as instance
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get as class
    pub fn as_class(&self) -> Option<&Class> {
        match self {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Get as event channel
    pub fn as_event(&self) -> Option<&EventChannel> {
        match self {
            Value::Event(e) => Some(e),
            _ => None,
        }
    }

    /// Read a record key; `Undefined` for non-records and missing keys
    pub fn key(&self, key: &str) -> Value {
        self.as_record()
            .and_then(|r| r.borrow().get(key).cloned())
            .unwrap_or_default()
    }

    /// Name of the value's kind, used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Record(_) => "record".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Object(o) => format!("instance of {}", o.class().name()),
            Value::Class(c) => format!("class {}", c.name()),
            Value::Event(e) => format!("event {}", e.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Event(a), Value::Event(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(l) => f.debug_list().entries(l.borrow().iter()).finish(),
            Value::Record(r) => f.debug_map().entries(r.borrow().iter()).finish(),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Object(o) => write!(f, "{:?}", o),
            Value::Class(c) => write!(f, "{:?}", c),
            Value::Event(e) => write!(f, "{:?}", e),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Instance> for Value {
    fn from(o: Instance) -> Self {
        Value::Object(o)
    }
}

impl From<Class> for Value {
    fn from(c: Class) -> Self {
        Value::Class(c)
    }
}

impl From<EventChannel> for Value {
    fn from(e: EventChannel) -> Self {
        Value::Event(e)
    }
}

/// Reference-counted native callable
///
/// Identity is the allocation: clones of a `Function` are the same function,
/// two closures with identical code are not.
#[derive(Clone)]
pub struct Function(Rc<NativeFn>);

impl Function {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> JooplResult<Value> + 'static,
    {
        Function(Rc::new(f))
    }

    /// Invoke with an explicit `this` binding
    pub fn call(&self, this: &Value, args: &[Value]) -> JooplResult<Value> {
        (self.0)(this, args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

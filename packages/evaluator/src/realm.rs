use crate::builtins;
use crate::execute::ExecutorOptions;
use crate::scope::Env;
use crate::value::{Object, ObjectRef, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Method tables backing primitive and built-in values
pub struct Intrinsics {
    pub(crate) object_methods: HashMap<&'static str, Value>,
    pub(crate) array_methods: HashMap<&'static str, Value>,
    pub(crate) string_methods: HashMap<&'static str, Value>,
    pub(crate) number_methods: HashMap<&'static str, Value>,
    pub(crate) function_methods: HashMap<&'static str, Value>,
    pub(crate) error_prototypes: HashMap<&'static str, ObjectRef>,
    pub(crate) array_constructor: Value,
}

/// Everything one execution can reach: global bindings, intrinsic methods
/// and limits. Components keep their realm alive so they can be rendered
/// after `execute` returns.
pub struct Realm {
    pub globals: Env,
    pub(crate) intrinsics: Intrinsics,
    pub options: ExecutorOptions,
    random_state: Cell<u64>,
}

impl Realm {
    pub fn new(options: ExecutorOptions) -> Rc<Self> {
        let error_prototypes = builtins::errors::prototypes();
        let intrinsics = Intrinsics {
            object_methods: builtins::object::methods(),
            array_methods: builtins::array::methods(),
            string_methods: builtins::string::methods(),
            number_methods: builtins::number::methods(),
            function_methods: builtins::function::methods(),
            array_constructor: builtins::array::constructor(),
            error_prototypes,
        };
        let globals = Env::global();
        builtins::install_globals(&globals, &intrinsics);

        Rc::new(Self {
            globals,
            intrinsics,
            options,
            random_state: Cell::new(0x2545_f491_4f6c_dd1d),
        })
    }

    /// Error object of the given built-in type, `Error` for unknown names
    pub fn make_error(&self, name: &str, message: &str) -> Value {
        let proto = self
            .intrinsics
            .error_prototypes
            .get(name)
            .or_else(|| self.intrinsics.error_prototypes.get("Error"))
            .cloned();
        let mut object = Object::with_proto(proto);
        object.properties.insert("message".to_string(), Value::string(message));
        Value::Object(Rc::new(RefCell::new(object)))
    }

    /// Deterministic xorshift sequence in `[0, 1)`
    pub fn next_random(&self) -> f64 {
        let mut x = self.random_state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.random_state.set(x);
        (x >> 11) as f64 / (1u64 << 53) as f64
    }
}

use std::rc::Rc;

use tandem_core::Value;

use crate::error::HostError;
use crate::instance::{self, Vm};

/// Name used when a component declares neither a name nor a tag.
pub const ANONYMOUS: &str = "<component>";

/// Produces an instance's initial local state.
pub type DataFn = Rc<dyn Fn(&Vm) -> Value>;
pub type RenderFn = Rc<dyn Fn(&Vm) -> String>;
pub type Hook = Rc<dyn Fn(&Vm)>;
/// What the host calls to (re-)render an instance.
pub type RenderTrigger = Rc<dyn Fn(&Vm)>;

/// Extension point over an instance's render-trigger slot.
///
/// At mount the host passes its native render entry point to `wrap` and
/// installs whatever comes back in its place. Every later update, forced or
/// prop-driven, goes through the returned trigger.
pub trait RenderHook: 'static {
    fn wrap(&self, vm: &Vm, native: RenderTrigger) -> RenderTrigger;
}

/// Reusable lifecycle hooks.
#[derive(Clone, Default)]
pub struct Mixin {
    pub created: Option<Hook>,
    pub destroyed: Option<Hook>,
}

impl Mixin {
    pub fn created(f: impl Fn(&Vm) + 'static) -> Self {
        Self {
            created: Some(Rc::new(f)),
            destroyed: None,
        }
    }

    pub fn destroyed(f: impl Fn(&Vm) + 'static) -> Self {
        Self {
            created: None,
            destroyed: Some(Rc::new(f)),
        }
    }
}

/// Plain component definition.
#[derive(Clone, Default)]
pub struct ComponentOptions {
    pub name: Option<String>,
    /// Registration tag; used for diagnostics when `name` is missing.
    pub tag: Option<String>,
    pub props: Vec<String>,
    pub data: Option<DataFn>,
    pub render: Option<RenderFn>,
    pub mixins: Vec<Mixin>,
    pub render_hook: Option<Rc<dyn RenderHook>>,
}

impl ComponentOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>) -> Self {
        self.props.push(name.into());
        self
    }

    pub fn props<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.props.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn data(mut self, f: impl Fn(&Vm) -> Value + 'static) -> Self {
        self.data = Some(Rc::new(f));
        self
    }

    pub fn render(mut self, f: impl Fn(&Vm) -> String + 'static) -> Self {
        self.render = Some(Rc::new(f));
        self
    }

    pub fn mixin(mut self, mixin: Mixin) -> Self {
        self.mixins.push(mixin);
        self
    }

    pub fn render_hook(mut self, hook: impl RenderHook) -> Self {
        self.render_hook = Some(Rc::new(hook));
        self
    }

    /// `name`, falling back to `tag`.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.tag.as_deref())
    }
}

/// A component "class": options plus an optional parent they extend.
///
/// Resolution walks from child to parent: the first `name`, `data`,
/// `render` and `render_hook` found wins; props and mixins accumulate,
/// parent first.
#[derive(Clone)]
pub struct Component(Rc<ComponentInner>);

struct ComponentInner {
    options: ComponentOptions,
    parent: Option<Component>,
}

impl Component {
    pub fn new(options: ComponentOptions) -> Self {
        Self(Rc::new(ComponentInner {
            options,
            parent: None,
        }))
    }

    pub fn extend(&self, options: ComponentOptions) -> Component {
        Component(Rc::new(ComponentInner {
            options,
            parent: Some(self.clone()),
        }))
    }

    pub fn options(&self) -> &ComponentOptions {
        &self.0.options
    }

    pub fn parent(&self) -> Option<&Component> {
        self.0.parent.as_ref()
    }

    fn find<T>(&self, pick: impl Fn(&ComponentOptions) -> Option<T>) -> Option<T> {
        let mut current = Some(self);
        while let Some(c) = current {
            if let Some(found) = pick(&c.0.options) {
                return Some(found);
            }
            current = c.parent();
        }
        None
    }

    fn chain(&self) -> Vec<&Component> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(c) = current {
            chain.push(c);
            current = c.parent();
        }
        chain.reverse();
        chain
    }

    pub fn name(&self) -> Option<String> {
        self.find(|o| o.display_name().map(str::to_string))
    }

    pub fn props(&self) -> Vec<String> {
        let mut props: Vec<String> = Vec::new();
        for c in self.chain() {
            for p in &c.0.options.props {
                if !props.contains(p) {
                    props.push(p.clone());
                }
            }
        }
        props
    }

    pub fn data(&self) -> Option<DataFn> {
        self.find(|o| o.data.clone())
    }

    pub fn render(&self) -> Option<RenderFn> {
        self.find(|o| o.render.clone())
    }

    pub fn render_hook(&self) -> Option<Rc<dyn RenderHook>> {
        self.find(|o| o.render_hook.clone())
    }

    pub fn mixins(&self) -> Vec<Mixin> {
        self.chain()
            .into_iter()
            .flat_map(|c| c.0.options.mixins.iter().cloned())
            .collect()
    }

    /// Creates an instance, runs its state producer and `created` hooks,
    /// installs its render trigger and renders it once.
    pub fn mount<K, V>(&self, props: impl IntoIterator<Item = (K, V)>) -> Result<Vm, HostError>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let props = props
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        instance::mount(self, props)
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Anything a component can be defined from.
#[derive(Clone)]
pub enum ComponentDef {
    Options(ComponentOptions),
    Class(Component),
}

impl ComponentDef {
    pub fn name(&self) -> Option<String> {
        match self {
            ComponentDef::Options(o) => o.display_name().map(str::to_string),
            ComponentDef::Class(c) => c.name(),
        }
    }
}

impl From<ComponentOptions> for ComponentDef {
    fn from(o: ComponentOptions) -> Self {
        ComponentDef::Options(o)
    }
}

impl From<Component> for ComponentDef {
    fn from(c: Component) -> Self {
        ComponentDef::Class(c)
    }
}

impl From<&Component> for ComponentDef {
    fn from(c: &Component) -> Self {
        ComponentDef::Class(c.clone())
    }
}

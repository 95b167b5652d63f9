// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Descriptions of desired output.
//!
//! A render produces a [`Node`]: nothing, a text leaf, one [`Element`], or a
//! list of nodes. Elements pair an [`ElementType`] with an optional [`Key`]
//! and immutable, reference-counted [`Props`]. Cloning any of these is cheap.
//!
//! Identity matters. Two props values that are the same allocation
//! ([`Props::ptr_eq`]) let a fiber bail out without rendering; component
//! types, contexts and memo wrappers compare by allocation as well.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::error::ComponentError;
use crate::hooks::RenderCx;

/// Result of rendering a component.
pub type Rendered = Result<Node, ComponentError>;

/// Sibling-unique identity of an element.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Rc<str>);

impl Key {
    /// The key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", &*self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self(Rc::from(alloc::format!("{value}")))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self(Rc::from(alloc::format!("{value}")))
    }
}

/// A handler stored in props.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&Value) -> Result<(), ComponentError>>);

impl Callback {
    /// Wraps a handler.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), ComponentError> + 'static,
    {
        Self(Rc::new(f))
    }

    /// Invokes the handler.
    pub fn call(&self, arg: &Value) -> Result<(), ComponentError> {
        (self.0)(arg)
    }

    /// Returns `true` if both handles share one allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0))
    }
}

/// A prop value, a hook dependency, or a context value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Str(Rc<str>),
    /// A nested description.
    Node(Node),
    /// A handler.
    Callback(Callback),
    /// Any other shared value, compared by allocation.
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// Identity comparison.
    ///
    /// Scalars and strings compare by value. `NaN` equals itself and `0.0`
    /// differs from `-0.0`. Everything reference counted compares by
    /// allocation.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a.is_same(b),
            (Self::Callback(a), Self::Callback(b)) => a.ptr_eq(b),
            (Self::Opaque(a), Self::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if any.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The handler payload, if any.
    #[must_use]
    pub const fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Callback(cb) => Some(cb),
            _ => None,
        }
    }

    /// Downcasts an opaque payload.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Opaque(v) => v.downcast_ref(),
            _ => None,
        }
    }

    /// Wraps any value as [`Value::Opaque`].
    pub fn opaque<T: 'static>(value: T) -> Self {
        Self::Opaque(Rc::new(value))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{:?}", &**v),
            Self::Node(n) => write!(f, "{n:?}"),
            Self::Callback(cb) => write!(f, "{cb:?}"),
            Self::Opaque(v) => write!(f, "Opaque({:p})", Rc::as_ptr(v)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(v) => f.write_str(v),
            other => write!(f, "{other:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<Rc<str>> for Value {
    fn from(v: Rc<str>) -> Self {
        Self::Str(v)
    }
}

impl From<Callback> for Value {
    fn from(v: Callback) -> Self {
        Self::Callback(v)
    }
}

impl From<Node> for Value {
    fn from(v: Node) -> Self {
        Self::Node(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A render callback that receives a context value.
#[derive(Clone)]
pub struct RenderProp(Rc<dyn Fn(&Value) -> Rendered>);

impl RenderProp {
    /// Wraps a render callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Rendered + 'static,
    {
        Self(Rc::new(f))
    }

    /// Invokes the callback.
    pub fn call(&self, value: &Value) -> Rendered {
        (self.0)(value)
    }
}

impl fmt::Debug for RenderProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderProp({:p})", Rc::as_ptr(&self.0))
    }
}

#[derive(Default)]
struct PropsInner {
    attrs: BTreeMap<Rc<str>, Value>,
    children: Node,
    render: Option<RenderProp>,
}

/// Immutable, shared element props.
#[derive(Clone, Default)]
pub struct Props(Rc<PropsInner>);

impl Props {
    /// Creates props with no attributes and no children.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates props holding only `children`.
    #[must_use]
    pub fn with_children(children: Node) -> Self {
        Self(Rc::new(PropsInner {
            children,
            ..PropsInner::default()
        }))
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.attrs.get(key)
    }

    /// Iterates attributes in key order.
    pub fn attrs(&self) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.0.attrs.iter()
    }

    /// Number of attributes.
    #[must_use]
    pub fn attr_count(&self) -> usize {
        self.0.attrs.len()
    }

    /// The children description.
    #[must_use]
    pub fn children(&self) -> &Node {
        &self.0.children
    }

    /// The render callback, for context consumers.
    #[must_use]
    pub fn render_prop(&self) -> Option<&RenderProp> {
        self.0.render.as_ref()
    }

    /// Direct text content, if the children collapse to a text leaf.
    #[must_use]
    pub fn text_content(&self) -> Option<&Rc<str>> {
        match &self.0.children {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `true` if both handles share one allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Shallow comparison: same attribute keys with identical values, and
    /// identical children.
    #[must_use]
    pub fn shallow_equal(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (&*self.0, &*other.0);
        a.attrs.len() == b.attrs.len()
            && a
                .attrs
                .iter()
                .all(|(k, v)| b.attrs.get(k).is_some_and(|w| v.is_same(w)))
            && a.children.is_same(&b.children)
            && match (&a.render, &b.render) {
                (None, None) => true,
                (Some(x), Some(y)) => Rc::ptr_eq(&x.0, &y.0),
                _ => false,
            }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in &self.0.attrs {
            map.entry(&&**k, v);
        }
        if !matches!(self.0.children, Node::Empty) {
            map.entry(&"children", &self.0.children);
        }
        map.finish()
    }
}

/// A description of rendered output.
#[derive(Clone, Default)]
pub enum Node {
    /// Renders nothing.
    #[default]
    Empty,
    /// A text leaf.
    Text(Rc<str>),
    /// One element.
    Element(Rc<Element>),
    /// An ordered list of nodes.
    List(Rc<[Node]>),
}

impl Node {
    /// A text leaf. Empty text renders nothing.
    #[must_use]
    pub fn text(text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        if text.is_empty() {
            Self::Empty
        } else {
            Self::Text(Rc::from(text))
        }
    }

    /// A list of nodes.
    pub fn list<I>(nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        Self::List(nodes.into_iter().map(Into::into).collect())
    }

    /// Identity comparison: text by value, everything else by allocation.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Element(a), Self::Element(b)) => Rc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns `true` for [`Node::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(t) => write!(f, "{:?}", &**t),
            Self::Element(e) => write!(f, "{e:?}"),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
        }
    }
}

impl From<&str> for Node {
    fn from(v: &str) -> Self {
        Self::text(v)
    }
}

impl From<String> for Node {
    fn from(v: String) -> Self {
        Self::text(v)
    }
}

impl From<i64> for Node {
    fn from(v: i64) -> Self {
        Self::Text(Rc::from(alloc::format!("{v}")))
    }
}

impl From<i32> for Node {
    fn from(v: i32) -> Self {
        Self::from(i64::from(v))
    }
}

impl From<Element> for Node {
    fn from(v: Element) -> Self {
        Self::Element(Rc::new(v))
    }
}

impl From<ElementBuilder> for Node {
    fn from(v: ElementBuilder) -> Self {
        Self::Element(Rc::new(v.build()))
    }
}

impl From<Vec<Node>> for Node {
    fn from(v: Vec<Node>) -> Self {
        Self::List(v.into())
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Empty, Into::into)
    }
}

type RenderFn = dyn Fn(&mut RenderCx<'_>, &Props) -> Rendered;

struct ComponentInner {
    name: Cow<'static, str>,
    render: Box<RenderFn>,
}

/// A function component. Identity is the allocation.
#[derive(Clone)]
pub struct Component(Rc<ComponentInner>);

impl Component {
    /// Creates a component from a render function.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, render: F) -> Self
    where
        F: Fn(&mut RenderCx<'_>, &Props) -> Rendered + 'static,
    {
        Self(Rc::new(ComponentInner {
            name: name.into(),
            render: Box::new(render),
        }))
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Runs the render function.
    pub fn render(&self, cx: &mut RenderCx<'_>, props: &Props) -> Rendered {
        (self.0.render)(cx, props)
    }

    /// Returns `true` if both handles name the same component.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Starts an element of this component.
    #[must_use]
    pub fn element(&self) -> ElementBuilder {
        ElementBuilder::new(ElementType::Function(self.clone()))
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0.name)
    }
}

/// A stateful component instance.
pub trait ClassComponent {
    /// Produces output for the current props.
    fn render(&mut self, props: &Props, context: Option<&Value>) -> Rendered;
}

type Constructor = dyn Fn(&Props) -> Box<dyn ClassComponent>;

struct ClassTypeInner {
    name: Cow<'static, str>,
    construct: Box<Constructor>,
    context: Option<Context>,
}

/// A class component type. Identity is the allocation.
#[derive(Clone)]
pub struct ClassType(Rc<ClassTypeInner>);

impl ClassType {
    /// Creates a class type from an instance constructor.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, construct: F) -> Self
    where
        F: Fn(&Props) -> Box<dyn ClassComponent> + 'static,
    {
        Self(Rc::new(ClassTypeInner {
            name: name.into(),
            construct: Box::new(construct),
            context: None,
        }))
    }

    /// Creates a class type that reads `context` on every render.
    pub fn with_context<F>(
        name: impl Into<Cow<'static, str>>,
        context: Context,
        construct: F,
    ) -> Self
    where
        F: Fn(&Props) -> Box<dyn ClassComponent> + 'static,
    {
        Self(Rc::new(ClassTypeInner {
            name: name.into(),
            construct: Box::new(construct),
            context: Some(context),
        }))
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The context read on render, if declared.
    #[must_use]
    pub fn context(&self) -> Option<&Context> {
        self.0.context.as_ref()
    }

    pub(crate) fn construct(&self, props: &Props) -> Box<dyn ClassComponent> {
        (self.0.construct)(props)
    }

    /// Returns `true` if both handles name the same class.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Starts an element of this class.
    #[must_use]
    pub fn element(&self) -> ElementBuilder {
        ElementBuilder::new(ElementType::Class(self.clone()))
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassType({})", self.0.name)
    }
}

struct ContextInner {
    name: Cow<'static, str>,
    default: Value,
}

/// A context: a value provided to a subtree. Identity is the allocation.
#[derive(Clone)]
pub struct Context(Rc<ContextInner>);

impl Context {
    /// Creates a context with a default value used outside any provider.
    pub fn new(name: impl Into<Cow<'static, str>>, default: impl Into<Value>) -> Self {
        Self(Rc::new(ContextInner {
            name: name.into(),
            default: default.into(),
        }))
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Value seen outside any provider.
    #[must_use]
    pub fn default_value(&self) -> &Value {
        &self.0.default
    }

    /// Returns `true` if both handles name the same context.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Starts a provider element supplying `value`.
    #[must_use]
    pub fn provider(&self, value: impl Into<Value>) -> ElementBuilder {
        ElementBuilder::new(ElementType::Provider(self.clone())).prop("value", value)
    }

    /// Creates a consumer element rendering `render` with the current value.
    pub fn consumer<F>(&self, render: F) -> ElementBuilder
    where
        F: Fn(&Value) -> Rendered + 'static,
    {
        let mut builder = ElementBuilder::new(ElementType::Consumer(self.clone()));
        builder.render = Some(RenderProp::new(render));
        builder
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({})", self.0.name)
    }
}

type CompareFn = dyn Fn(&Props, &Props) -> bool;

struct MemoInner {
    inner: Component,
    compare: Option<Box<CompareFn>>,
}

/// A function component that skips rendering when its props are unchanged.
#[derive(Clone)]
pub struct Memo(Rc<MemoInner>);

impl Memo {
    /// Memoizes `inner` using shallow prop comparison.
    #[must_use]
    pub fn new(inner: Component) -> Self {
        Self(Rc::new(MemoInner {
            inner,
            compare: None,
        }))
    }

    /// Memoizes `inner` with a custom equality.
    pub fn with_compare<F>(inner: Component, compare: F) -> Self
    where
        F: Fn(&Props, &Props) -> bool + 'static,
    {
        Self(Rc::new(MemoInner {
            inner,
            compare: Some(Box::new(compare)),
        }))
    }

    /// The wrapped component.
    #[must_use]
    pub fn inner(&self) -> &Component {
        &self.0.inner
    }

    /// Returns `true` if a custom comparator was supplied.
    #[must_use]
    pub fn has_compare(&self) -> bool {
        self.0.compare.is_some()
    }

    /// Compares props with the custom comparator or shallow equality.
    #[must_use]
    pub fn props_equal(&self, prev: &Props, next: &Props) -> bool {
        match &self.0.compare {
            Some(compare) => compare(prev, next),
            None => prev.shallow_equal(next),
        }
    }

    /// Returns `true` if both handles name the same memo wrapper.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Starts an element of this memo component.
    #[must_use]
    pub fn element(&self) -> ElementBuilder {
        ElementBuilder::new(ElementType::Memo(self.clone()))
    }
}

impl fmt::Debug for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Memo({})", self.0.inner.name())
    }
}

/// What an element renders as.
#[derive(Clone, Debug)]
pub enum ElementType {
    /// A host node of the named kind.
    Host(Rc<str>),
    /// A function component.
    Function(Component),
    /// A class component.
    Class(ClassType),
    /// A transparent grouping of children.
    Fragment,
    /// Supplies a context value to its subtree.
    Provider(Context),
    /// Reads a context value through a render callback.
    Consumer(Context),
    /// A memoized function component.
    Memo(Memo),
}

impl ElementType {
    /// Type identity used to decide whether a fiber can be reused.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Host(a), Self::Host(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Class(a), Self::Class(b)) => a.ptr_eq(b),
            (Self::Fragment, Self::Fragment) => true,
            (Self::Provider(a), Self::Provider(b)) | (Self::Consumer(a), Self::Consumer(b)) => {
                a.ptr_eq(b)
            }
            (Self::Memo(a), Self::Memo(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Short name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Host(kind) => kind,
            Self::Function(c) => c.name(),
            Self::Class(c) => c.name(),
            Self::Fragment => "Fragment",
            Self::Provider(_) => "Provider",
            Self::Consumer(_) => "Consumer",
            Self::Memo(m) => m.inner().name(),
        }
    }
}

/// An element: a type, an optional key, and props.
#[derive(Clone, Debug)]
pub struct Element {
    ty: ElementType,
    key: Option<Key>,
    props: Props,
}

impl Element {
    /// Creates an element from parts.
    #[must_use]
    pub const fn new(ty: ElementType, key: Option<Key>, props: Props) -> Self {
        Self { ty, key, props }
    }

    /// The element type.
    #[must_use]
    pub const fn ty(&self) -> &ElementType {
        &self.ty
    }

    /// The key, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// The props.
    #[must_use]
    pub const fn props(&self) -> &Props {
        &self.props
    }
}

/// Starts a host element of the given kind.
#[must_use]
pub fn el(kind: &str) -> ElementBuilder {
    ElementBuilder::new(ElementType::Host(Rc::from(kind)))
}

/// Starts a fragment.
#[must_use]
pub fn fragment() -> ElementBuilder {
    ElementBuilder::new(ElementType::Fragment)
}

/// Incremental construction of an [`Element`].
///
/// One `child` call gives a single child; several give a list, and
/// [`children`](Self::children) always gives a list.
#[derive(Debug)]
pub struct ElementBuilder {
    ty: ElementType,
    key: Option<Key>,
    attrs: BTreeMap<Rc<str>, Value>,
    children: Vec<Node>,
    force_list: bool,
    render: Option<RenderProp>,
}

impl ElementBuilder {
    /// Starts an element of `ty`.
    #[must_use]
    pub fn new(ty: ElementType) -> Self {
        Self {
            ty,
            key: None,
            attrs: BTreeMap::new(),
            children: Vec::new(),
            force_list: false,
            render: None,
        }
    }

    /// Sets the key.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(Rc::from(key), value.into());
        self
    }

    /// Sets a handler attribute.
    #[must_use]
    pub fn on<F>(self, key: &str, handler: F) -> Self
    where
        F: Fn(&Value) -> Result<(), ComponentError> + 'static,
    {
        self.prop(key, Callback::new(handler))
    }

    /// Appends one child.
    #[must_use]
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends children as a list.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self.force_list = true;
        self
    }

    /// Finishes the element.
    #[must_use]
    pub fn build(self) -> Element {
        let children = if !self.force_list && self.children.len() <= 1 {
            self.children.into_iter().next().unwrap_or_default()
        } else {
            Node::List(self.children.into())
        };
        let props = Props(Rc::new(PropsInner {
            attrs: self.attrs,
            children,
            render: self.render,
        }));
        Element::new(self.ty, self.key, props)
    }

    /// Finishes the element as a [`Node`].
    #[must_use]
    pub fn into_node(self) -> Node {
        self.into()
    }
}

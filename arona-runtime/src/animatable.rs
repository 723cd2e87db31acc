//! # Animatable 模块
//!
//! 可动画对象接口。计时任务只通过这里的属性读写修改共享状态，
//! 主循环每帧读取一次用于绘制，写入遵循“最后写入者生效”。
//!
//! ## 设计说明
//!
//! 共享对象使用 `Arc<Mutex<T>>` 实现内部可变性，
//! 计时任务与主循环可以同时持有同一个句柄。

use std::sync::{Arc, Mutex, MutexGuard};

/// 获取锁；持锁方 panic 后数据仍然可用，直接取回内部值
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// 可动画对象接口
///
/// 对象通过实现此 trait 声明自己有哪些属性可以被动画。
pub trait Animatable: Send + Sync + 'static {
    /// 获取属性的当前值，属性不存在时返回 `None`
    fn get_property(&self, property_id: &str) -> Option<f32>;

    /// 设置属性的新值，属性不存在时返回 `false`
    fn set_property(&self, property_id: &str, value: f32) -> bool;

    /// 获取所有可动画属性的列表
    fn property_list(&self) -> &'static [&'static str];
}

/// 单个共享 f32 值
///
/// 用于淡入淡出遮罩、回复选项等只有透明度的对象。
#[derive(Debug, Clone)]
pub struct SharedValue {
    value: Arc<Mutex<f32>>,
}

impl SharedValue {
    pub fn new(initial_value: f32) -> Self {
        Self {
            value: Arc::new(Mutex::new(initial_value)),
        }
    }

    pub fn get(&self) -> f32 {
        *lock(&self.value)
    }

    pub fn set(&self, value: f32) {
        *lock(&self.value) = value;
    }
}

impl Default for SharedValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Animatable for SharedValue {
    fn get_property(&self, property_id: &str) -> Option<f32> {
        match property_id {
            "alpha" | "value" => Some(self.get()),
            _ => None,
        }
    }

    fn set_property(&self, property_id: &str, value: f32) -> bool {
        match property_id {
            "alpha" | "value" => {
                self.set(value);
                true
            }
            _ => false,
        }
    }

    fn property_list(&self) -> &'static [&'static str] {
        &["alpha", "value"]
    }
}

//! `Heightmap` userdata: the script-side view of [`nebula_terrain::Heightmap`].
//!
//! ```lua
//! function generate_heightmap(x, y, w, h, seed)
//!     local map = Heightmap(w, h)
//!     map:noise(x, y, 0.01, 4, 24, seed)
//!     map:add(64)
//!     return map
//! end
//! ```

use glam::IVec2;
use mlua::{Lua, UserData, UserDataFields, UserDataMethods, Value};
use nebula_terrain::{Heightmap, HeightmapParams, HeightmapSampler};

/// Cap on cells a script may allocate in one heightmap.
const MAX_CELLS: u64 = 4096 * 4096;
const MAX_OCTAVES: u32 = 16;

/// Heightmap owned by a script value.
#[derive(Clone, Debug)]
pub struct LuaHeightmap(pub Heightmap);

fn out_of_bounds(map: &Heightmap, x: u32, y: u32) -> mlua::Error {
    mlua::Error::runtime(format!(
        "heightmap index ({x}, {y}) out of bounds for {}x{} map",
        map.width(),
        map.height()
    ))
}

/// Applies `op` with a scalar or cell-by-cell with another heightmap.
fn combine(map: &mut Heightmap, operand: Value, op: fn(f32, f32) -> f32) -> mlua::Result<()> {
    match operand {
        Value::Integer(i) => map.map(|v| op(v, i as f32)),
        Value::Number(n) => map.map(|v| op(v, n as f32)),
        Value::UserData(ud) => {
            let other = ud.borrow::<LuaHeightmap>()?;
            if !map.zip_with(&other.0, op) {
                return Err(mlua::Error::runtime(format!(
                    "heightmap size mismatch: {} vs {}",
                    map.size(),
                    other.0.size()
                )));
            }
        }
        other => {
            return Err(mlua::Error::runtime(format!(
                "expected number or Heightmap, got {}",
                other.type_name()
            )));
        }
    }
    Ok(())
}

impl UserData for LuaHeightmap {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("width", |_, this| Ok(this.0.width()));
        fields.add_field_method_get("height", |_, this| Ok(this.0.height()));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("get", |_, this, (x, y): (u32, u32)| {
            this.0.get(x, y).ok_or_else(|| out_of_bounds(&this.0, x, y))
        });
        methods.add_method_mut("set", |_, this, (x, y, value): (u32, u32, f32)| {
            if this.0.set(x, y, value) {
                Ok(())
            } else {
                Err(out_of_bounds(&this.0, x, y))
            }
        });
        methods.add_method_mut("fill", |_, this, value: f32| {
            this.0.fill(value);
            Ok(())
        });
        methods.add_method_mut("add", |_, this, operand: Value| {
            combine(&mut this.0, operand, |a, b| a + b)
        });
        methods.add_method_mut("mul", |_, this, operand: Value| {
            combine(&mut this.0, operand, |a, b| a * b)
        });
        methods.add_method_mut("min", |_, this, operand: Value| {
            combine(&mut this.0, operand, f32::min)
        });
        methods.add_method_mut("max", |_, this, operand: Value| {
            combine(&mut this.0, operand, f32::max)
        });
        methods.add_method_mut("abs", |_, this, ()| {
            this.0.map(f32::abs);
            Ok(())
        });
        methods.add_method_mut(
            "noise",
            |_,
             this,
             (x, y, frequency, octaves, amplitude, seed): (
                i32,
                i32,
                f64,
                u32,
                Option<f64>,
                Option<i64>,
            )| {
                let sampler = HeightmapSampler::new(HeightmapParams {
                    seed: seed.unwrap_or(0) as u64,
                    octaves: octaves.min(MAX_OCTAVES),
                    base_frequency: frequency,
                    amplitude: amplitude.unwrap_or(1.0),
                    ..Default::default()
                });
                this.0.add_noise(IVec2::new(x, y), &sampler);
                Ok(())
            },
        );
    }
}

/// Installs the global `Heightmap(width, height)` constructor.
pub(crate) fn register(lua: &Lua) -> mlua::Result<()> {
    let constructor = lua.create_function(|_, (width, height): (u32, u32)| {
        if u64::from(width) * u64::from(height) > MAX_CELLS {
            return Err(mlua::Error::runtime(format!(
                "heightmap {width}x{height} exceeds {MAX_CELLS} cells"
            )));
        }
        Ok(LuaHeightmap(Heightmap::new(width, height)))
    })?;
    lua.globals().set("Heightmap", constructor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::AnyUserData;

    fn eval_map(source: &str) -> Heightmap {
        let lua = Lua::new();
        register(&lua).unwrap();
        let ud: AnyUserData = lua.load(source).eval().unwrap();
        let map = ud.borrow::<LuaHeightmap>().unwrap().0.clone();
        map
    }

    #[test]
    fn test_constructor_and_fields() {
        let lua = Lua::new();
        register(&lua).unwrap();
        let (w, h): (u32, u32) = lua
            .load("local m = Heightmap(8, 4); return m.width, m.height")
            .eval()
            .unwrap();
        assert_eq!((w, h), (8, 4));
    }

    #[test]
    fn test_set_get_and_arithmetic() {
        let map = eval_map(
            r#"
            local m = Heightmap(2, 2)
            m:fill(3)
            m:set(1, 0, -4)
            m:abs()
            m:mul(2)
            m:add(0.5)
            return m
            "#,
        );
        assert_eq!(map.values(), &[6.5, 8.5, 6.5, 6.5]);
    }

    #[test]
    fn test_combine_with_other_map() {
        let map = eval_map(
            r#"
            local a = Heightmap(2, 1)
            local b = Heightmap(2, 1)
            a:set(0, 0, 1); a:set(1, 0, 5)
            b:fill(3)
            a:min(b)
            return a
            "#,
        );
        assert_eq!(map.values(), &[1.0, 3.0]);
    }

    #[test]
    fn test_out_of_bounds_raises() {
        let lua = Lua::new();
        register(&lua).unwrap();
        let err = lua
            .load("local m = Heightmap(2, 2); return m:get(2, 0)")
            .exec()
            .unwrap_err();
        assert!(err.to_string().contains("out of bounds"), "{err}");
    }

    #[test]
    fn test_size_mismatch_raises() {
        let lua = Lua::new();
        register(&lua).unwrap();
        let result = lua
            .load("local a = Heightmap(2, 2); a:add(Heightmap(3, 3))")
            .exec();
        assert!(result.is_err());
    }

    #[test]
    fn test_noise_is_deterministic() {
        let source = "local m = Heightmap(16, 16); m:noise(32, 64, 0.05, 3, 10, 7); return m";
        let a = eval_map(source);
        let b = eval_map(source);
        assert_eq!(a, b);
        let (lo, hi) = a.min_max().unwrap();
        assert!(lo < hi, "noise should vary across the map");
    }

    #[test]
    fn test_oversized_map_rejected() {
        let lua = Lua::new();
        register(&lua).unwrap();
        assert!(lua.load("return Heightmap(100000, 100000)").exec().is_err());
    }
}

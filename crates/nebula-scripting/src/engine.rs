//! The shared Lua state and the isolated environments scripts run in.
//!
//! All script calls go through one main Lua state. Values handed out by `mlua`
//! (tables, functions, userdata) own their stack/registry slot and release it
//! on drop, so every exit path, including `?` early returns, leaves the shared
//! stack balanced.

use mlua::{Lua, LuaOptions, StdLib, Table, Value};

/// Library tables each environment gets a private copy of.
const LIBRARIES: &[&str] = &["string", "table", "math"];

/// Base functions that would run code against the shared globals.
const REMOVED_GLOBALS: &[&str] = &["load", "loadfile", "dofile"];

/// The main script context shared by every loaded definition.
pub struct ScriptEngine {
    lua: Lua,
}

impl ScriptEngine {
    /// Creates the main state with the string, table, and math libraries and
    /// the engine-provided script API.
    pub fn new() -> mlua::Result<Self> {
        let lua = Lua::new_with(
            StdLib::STRING | StdLib::TABLE | StdLib::MATH,
            LuaOptions::default(),
        )?;
        crate::heightmap::register(&lua)?;

        let globals = lua.globals();
        for name in REMOVED_GLOBALS {
            globals.raw_set(*name, Value::Nil)?;
        }
        // The string metatable would otherwise hand out the shared string library.
        lua.load("getmetatable('').__metatable = false")
            .set_name("=engine")
            .exec()?;
        Ok(Self { lua })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Creates a fresh environment. Reads fall through to the engine globals;
    /// writes, including through `_G`, stay in the environment.
    pub fn create_environment(&self) -> mlua::Result<ScriptEnv> {
        let globals = self.lua.globals();
        let table = self.lua.create_table()?;
        table.raw_set("_G", table.clone())?;

        for name in LIBRARIES {
            if let Value::Table(library) = globals.raw_get::<Value>(*name)? {
                let copy = self.lua.create_table()?;
                for pair in library.pairs::<Value, Value>() {
                    let (key, value) = pair?;
                    copy.raw_set(key, value)?;
                }
                table.raw_set(*name, copy)?;
            }
        }

        let meta = self.lua.create_table()?;
        meta.raw_set("__index", globals)?;
        meta.raw_set("__metatable", false)?;
        table.set_metatable(Some(meta));
        Ok(ScriptEnv { table })
    }
}

/// Namespace holding the globals and functions of one loaded script.
pub struct ScriptEnv {
    table: Table,
}

impl ScriptEnv {
    /// Runs `source` with this environment as its global table.
    pub fn exec(&self, engine: &ScriptEngine, name: &str, source: &str) -> mlua::Result<()> {
        engine
            .lua
            .load(source)
            .set_name(format!("@{name}"))
            .set_environment(self.table.clone())
            .exec()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

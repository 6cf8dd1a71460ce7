use super::FleetService;
use crate::db::paths;
use crate::error::FleetResult;
use crate::models::{CreateModuleInput, Mission, Module, Record, UpdateModuleInput};

impl FleetService {
    pub fn list_modules(&self, starship_id: &str) -> FleetResult<Vec<Record<Module>>> {
        self.read_all(&paths::modules(starship_id))
    }

    pub fn get_module(&self, starship_id: &str, module_id: &str) -> FleetResult<Record<Module>> {
        self.require(&paths::module(starship_id, module_id), "Module")
    }

    /// Add a room. Any member of the starship may do this.
    pub fn add_module(
        &self,
        starship_id: &str,
        actor: Option<&str>,
        input: CreateModuleInput,
    ) -> FleetResult<Record<Module>> {
        self.require_member(starship_id, actor)?;
        let module = self.insert(&paths::modules(starship_id), Module::from(input))?;
        tracing::info!(%starship_id, module_id = %module.id, "Module added");
        Ok(module)
    }

    pub fn update_module(
        &self,
        starship_id: &str,
        module_id: &str,
        actor: Option<&str>,
        input: UpdateModuleInput,
    ) -> FleetResult<Record<Module>> {
        self.require_member(starship_id, actor)?;
        self.patch(&paths::module(starship_id, module_id), &input, "Module")?;
        self.get_module(starship_id, module_id)
    }

    /// Remove a room together with every mission assigned to it.
    pub fn delete_module(
        &self,
        starship_id: &str,
        module_id: &str,
        actor: Option<&str>,
    ) -> FleetResult<()> {
        self.require_member(starship_id, actor)?;
        self.get_module(starship_id, module_id)?;

        let missions: Vec<Record<Mission>> = self.read_all(&paths::missions(starship_id))?;
        let mut removed = 0;
        for mission in missions
            .iter()
            .filter(|m| m.data.module_id.as_deref() == Some(module_id))
        {
            if self.db.delete(&paths::mission(starship_id, &mission.id))? {
                removed += 1;
            }
        }

        self.db.delete(&paths::module(starship_id, module_id))?;
        tracing::info!(%starship_id, %module_id, removed, "Module deleted");

        self.refresh_aggregates_after_write(starship_id);
        Ok(())
    }
}
